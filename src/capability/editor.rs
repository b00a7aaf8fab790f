//! Pass-through capability used where the client edits content by hand.

use super::{Capability, CapabilityOutput};
use crate::workflow::ExecutionRecord;

pub const NAME: &str = "html_editor";

pub struct HtmlEditor;

impl Capability for HtmlEditor {
    fn name(&self) -> &str {
        NAME
    }

    fn invoke(&self, mut record: ExecutionRecord) -> CapabilityOutput {
        let content = record
            .current_input()
            .map(|c| c.into_owned())
            .unwrap_or_default();
        record.set_result(content);
        record.into()
    }
}
