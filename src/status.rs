use serde::Serialize;
use tokio::sync::mpsc;

/// Progress and failure notices for the capture UI.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StatusEvent {
    #[serde(rename_all = "camelCase")]
    Started { session_id: String },
    #[serde(rename_all = "camelCase")]
    PointsRemaining { collected: usize, remaining: usize },
    Saving,
    #[serde(rename_all = "camelCase")]
    Saved { base_name: String },
    Failed { message: String },
    Cancelled,
}

impl StatusEvent {
    pub fn message(&self) -> String {
        match self {
            StatusEvent::Started { .. } => {
                "click 4 points to define the capture region; the view is fixed once capture starts"
                    .to_string()
            }
            StatusEvent::PointsRemaining { remaining, .. } => {
                format!("need {remaining} more points")
            }
            StatusEvent::Saving => "saving...".to_string(),
            StatusEvent::Saved { base_name } => format!("saved {base_name}"),
            StatusEvent::Failed { message } => format!("save failed: {message}"),
            StatusEvent::Cancelled => "capture cancelled".to_string(),
        }
    }
}

pub trait StatusSink: Send + Sync {
    fn publish(&self, event: StatusEvent);
}

impl StatusSink for mpsc::UnboundedSender<StatusEvent> {
    fn publish(&self, event: StatusEvent) {
        let _ = self.send(event);
    }
}
