use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::AppError;
use crate::ports::WalletProvider;

/// Slot standing in for the wallet's global binding. The binding may appear (or vanish)
/// at any time, so every `get` reads the slot afresh.
#[derive(Clone, Default)]
pub struct ProviderHandle {
    binding: Arc<RwLock<Option<Arc<dyn WalletProvider>>>>,
}

impl ProviderHandle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn installed(provider: Arc<dyn WalletProvider>) -> Self {
        let handle = Self::default();
        handle.install(provider);
        handle
    }

    pub fn install(&self, provider: Arc<dyn WalletProvider>) {
        match self.binding.write() {
            Ok(mut g) => *g = Some(provider),
            Err(poisoned) => *poisoned.into_inner() = Some(provider),
        }
    }

    pub fn uninstall(&self) {
        match self.binding.write() {
            Ok(mut g) => *g = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.peek().is_some()
    }

    pub fn get(&self) -> Result<Arc<dyn WalletProvider>, AppError> {
        self.peek().ok_or_else(AppError::provider_not_installed)
    }

    fn peek(&self) -> Option<Arc<dyn WalletProvider>> {
        match self.binding.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("installed", &self.is_installed())
            .finish()
    }
}
