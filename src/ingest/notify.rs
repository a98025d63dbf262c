//! User-visible notifications from ingestion
//!
//! The pipeline decides what to say and for how long; whoever owns the
//! screen decides how to show it.

use crate::font::format::FontFormat;
use std::time::Duration;
use tokio::sync::mpsc;

/// A toast-style message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub duration: Duration,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl Notifier for mpsc::UnboundedSender<Notification> {
    fn notify(&self, notification: Notification) {
        // Receiver gone means nobody is watching; nothing to do
        let _ = self.send(notification);
    }
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// One notice for every oversized file in a drop
pub fn oversized_notice(
    names: &[String],
    shown: usize,
    limit_mib: u64,
    duration: Duration,
) -> Notification {
    let listed = names
        .iter()
        .take(shown)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let message = if names.len() > shown {
        format!(
            "File too large (>{}MB): {} and {} more",
            limit_mib,
            listed,
            names.len() - shown
        )
    } else {
        format!("File too large (>{}MB): {}", limit_mib, listed)
    };
    Notification { message, duration }
}

/// One notice for the unsupported files of a batch; stays up longer the
/// more files failed.
pub fn unsupported_notice(
    failures: &[(String, FontFormat)],
    max_name_chars: usize,
    per_file: Duration,
) -> Option<Notification> {
    match failures {
        [] => None,
        [(name, format)] => Some(Notification {
            message: format!("{} ({}) is not supported", name, format),
            duration: per_file,
        }),
        _ => {
            let names = failures
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let names = if names.chars().count() > max_name_chars {
                let truncated: String = names.chars().take(max_name_chars).collect();
                format!("{}...", truncated)
            } else {
                names
            };
            Some(Notification {
                message: format!("{} files are not supported: {}", failures.len(), names),
                duration: per_file * failures.len() as u32,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_SECONDS: Duration = Duration::from_millis(5000);

    #[test]
    fn test_oversized_names_first_three() {
        let names: Vec<String> = (1..=5).map(|i| format!("big{i}.ttf")).collect();
        let notice = oversized_notice(&names, 3, 20, FIVE_SECONDS);
        assert_eq!(
            notice.message,
            "File too large (>20MB): big1.ttf, big2.ttf, big3.ttf and 2 more"
        );
        assert_eq!(notice.duration, FIVE_SECONDS);

        let notice = oversized_notice(&names[..1], 3, 20, FIVE_SECONDS);
        assert_eq!(notice.message, "File too large (>20MB): big1.ttf");
    }

    #[test]
    fn test_single_unsupported_file() {
        let notice = unsupported_notice(
            &[("old.pfb".to_string(), FontFormat::Pfb)],
            300,
            FIVE_SECONDS,
        )
        .unwrap();
        assert_eq!(notice.message, "old.pfb (PFB) is not supported");
        assert_eq!(notice.duration, FIVE_SECONDS);
    }

    #[test]
    fn test_many_unsupported_files_scale_duration() {
        let failures: Vec<(String, FontFormat)> = (0..4)
            .map(|i| (format!("metrics{i}.afm"), FontFormat::Afm))
            .collect();
        let notice = unsupported_notice(&failures, 300, FIVE_SECONDS).unwrap();
        assert!(notice.message.starts_with("4 files are not supported: metrics0.afm"));
        assert_eq!(notice.duration, Duration::from_millis(20_000));
    }

    #[test]
    fn test_long_name_lists_are_truncated() {
        let failures: Vec<(String, FontFormat)> = (0..40)
            .map(|i| (format!("a-rather-long-file-name-{i:02}.vfb"), FontFormat::Vfb))
            .collect();
        let notice = unsupported_notice(&failures, 300, FIVE_SECONDS).unwrap();
        let names = notice
            .message
            .strip_prefix("40 files are not supported: ")
            .unwrap();
        assert!(names.ends_with("..."));
        assert_eq!(names.chars().count(), 303);
    }

    #[test]
    fn test_no_failures_no_notice() {
        assert!(unsupported_notice(&[], 300, FIVE_SECONDS).is_none());
    }

    #[test]
    fn test_channel_notifier_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.notify(Notification {
            message: "hello".to_string(),
            duration: FIVE_SECONDS,
        });
        assert_eq!(rx.try_recv().unwrap().message, "hello");
    }
}
