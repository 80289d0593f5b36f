use std::fmt::Display;

pub type EngineResult<T, E = EngineReport> = core::result::Result<T, E>;

/// Error type returned by everything in this crate.
///
/// Wraps an [`eyre::Report`] so that `?` works on both eyre reports and
/// `windows::core::Error` values without the latter needing `std::error::Error`.
pub struct EngineReport {
    inner: eyre::Report,
}

impl EngineReport {
    pub fn report(&self) -> &eyre::Report {
        &self.inner
    }

    pub fn into_report(self) -> eyre::Report {
        self.inner
    }
}

impl From<eyre::Report> for EngineReport {
    fn from(report: eyre::Report) -> Self {
        Self { inner: report }
    }
}

impl From<std::io::Error> for EngineReport {
    fn from(error: std::io::Error) -> Self {
        Self {
            inner: eyre::Report::new(error),
        }
    }
}

impl From<toml::de::Error> for EngineReport {
    fn from(error: toml::de::Error) -> Self {
        Self {
            inner: eyre::Report::new(error),
        }
    }
}

impl From<toml::ser::Error> for EngineReport {
    fn from(error: toml::ser::Error) -> Self {
        Self {
            inner: eyre::Report::new(error),
        }
    }
}

impl std::fmt::Display for EngineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

impl std::fmt::Debug for EngineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.inner, f)
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for EngineReport {
    fn from(error: windows::core::Error) -> Self {
        Self {
            inner: eyre::Report::new(WrappedWindowsError::from(error)),
        }
    }
}

#[cfg(windows)]
pub struct WrappedWindowsError {
    inner: windows::core::Error,
}

#[cfg(windows)]
impl WrappedWindowsError {
    pub fn code(&self) -> windows::core::HRESULT {
        self.inner.code()
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for WrappedWindowsError {
    fn from(error: windows::core::Error) -> Self {
        Self { inner: error }
    }
}

#[cfg(windows)]
impl std::error::Error for WrappedWindowsError {}

#[cfg(windows)]
impl std::fmt::Display for WrappedWindowsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[cfg(windows)]
impl std::fmt::Debug for WrappedWindowsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Attaches a description of the failed step to a Win32/COM result.
pub trait HresultContext<T> {
    fn context<D>(self, msg: D) -> EngineResult<T>
    where
        D: Display + Send + Sync + 'static;
}

#[cfg(windows)]
impl<T> HresultContext<T> for windows::core::Result<T> {
    fn context<D>(self, msg: D) -> EngineResult<T>
    where
        D: Display + Send + Sync + 'static,
    {
        self.map_err(|error| {
            EngineReport::from(eyre::Report::new(WrappedWindowsError::from(error)).wrap_err(msg))
        })
    }
}

impl<T> HresultContext<T> for EngineResult<T> {
    fn context<D>(self, msg: D) -> EngineResult<T>
    where
        D: Display + Send + Sync + 'static,
    {
        self.map_err(|report| EngineReport::from(report.into_report().wrap_err(msg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    fn read_missing() -> EngineResult<String> {
        let contents = std::fs::read_to_string("/definitely/not/here/d3d12_engine.toml")
            .wrap_err("Failed to read config")?;
        Ok(contents)
    }

    #[test]
    fn io_errors_keep_their_context() {
        let error = read_missing().unwrap_err();
        assert_eq!(error.to_string(), "Failed to read config");
        assert_eq!(error.report().chain().count(), 2);
    }

    #[test]
    fn context_stacks_on_engine_results() {
        let failed: EngineResult<()> = Err(eyre::eyre!("device removed").into());
        let error = failed.context("Failed to present frame.").unwrap_err();
        let chain: Vec<String> = error.report().chain().map(|e| e.to_string()).collect();
        assert_eq!(chain, vec!["Failed to present frame.", "device removed"]);
    }

    #[test]
    fn toml_errors_convert() {
        let parsed: Result<toml::Value, _> = toml::from_str("width = ");
        let error: EngineReport = parsed.unwrap_err().into();
        assert!(!error.to_string().is_empty());
    }
}
