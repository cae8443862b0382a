use std::sync::Arc;

use crate::ante::{AnteStage, Context, StageKind};
use crate::error::AnteError;
use crate::types::{ExtensionOption, Tx};

/// Decides whether the node understands a critical extension option.
pub type ExtensionOptionChecker = Arc<dyn Fn(&ExtensionOption) -> bool + Send + Sync>;

/// The default policy: no extension options are understood.
pub fn reject_all_extensions() -> ExtensionOptionChecker {
    Arc::new(|_: &ExtensionOption| false)
}

/// Rejects transactions carrying critical extension options the checker does
/// not accept. Non-critical options are ignored.
pub struct ExtensionOptions {
    checker: ExtensionOptionChecker,
}

impl ExtensionOptions {
    pub fn new(checker: ExtensionOptionChecker) -> Self {
        Self { checker }
    }
}

impl AnteStage for ExtensionOptions {
    fn kind(&self) -> StageKind {
        StageKind::ExtensionOptions
    }

    fn handle(&self, _ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        if tx.body.extension_options.iter().all(|opt| (self.checker)(opt)) {
            Ok(())
        } else {
            Err(AnteError::UnknownExtensionOptions)
        }
    }
}
