use serde::Serialize;

/// Reply to a write that carried no fields.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}
