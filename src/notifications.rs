//! Desktop notifications for timer events.

use log::warn;
use notify_rust::Notification;
use std::thread;

/// Shows a notification when a work session is completed.
/// Runs in a background thread to avoid blocking.
pub fn notify_work_complete(count: u32, message: Option<String>) {
    thread::spawn(move || {
        let mut body = if count == 1 {
            "Great work! You've completed 1 session today.\nTime for a break.".to_string()
        } else {
            format!(
                "Great work! You've completed {} sessions today.\nTime for a break.",
                count
            )
        };
        if let Some(message) = message {
            body.push_str(&format!("\nSession: {message}"));
        }

        if let Err(e) = Notification::new()
            .summary("Session Complete! 🍅")
            .body(&body)
            .sound_name("default")
            .show()
        {
            warn!("Failed to show notification: {e}");
        }
    });
}

/// Shows a notification when a long break starts.
/// Runs in a background thread to avoid blocking.
pub fn notify_long_break_start(duration_mins: u32) {
    thread::spawn(move || {
        if let Err(e) = Notification::new()
            .summary("Long Break Time! 🎉")
            .body(&format!(
                "You've earned a {} minute break. Great job staying focused!",
                duration_mins
            ))
            .sound_name("default")
            .show()
        {
            warn!("Failed to show notification: {e}");
        }
    });
}

/// Shows a notification when a break runs out and the next work session
/// waits for confirmation. Runs in a background thread to avoid blocking.
pub fn notify_break_complete() {
    thread::spawn(|| {
        if let Err(e) = Notification::new()
            .summary("Break Over! ☕")
            .body("Start the next session when you're ready, or extend the break.")
            .sound_name("default")
            .show()
        {
            warn!("Failed to show notification: {e}");
        }
    });
}

#[cfg(test)]
mod tests {
    // Note: Notification tests are tricky because they interact with the system
    // and may hang waiting for user interaction. They are ignored by default.
    // Run with `cargo test -- --ignored` to execute them.

    use super::*;

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_work_notification_singular() {
        notify_work_complete(1, None);
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_work_notification_with_message() {
        notify_work_complete(5, Some("quarterly report".to_string()));
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_break_notification() {
        notify_break_complete();
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_long_break_notification() {
        notify_long_break_start(20);
    }
}
