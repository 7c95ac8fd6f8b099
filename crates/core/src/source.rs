use crate::error::Result;

/// Value-read callback for one monitored parameter.
///
/// Implementations perform whatever I/O is needed to obtain the current
/// value. The engine driver calls `read` outside its critical section and
/// treats an `Err` as "no data" for that read.
pub trait ParameterSource: Send {
    /// Parameter path this source answers for, e.g.
    /// `"Device.DeviceInfo.ProcessStatus.CPUUsage"`.
    fn reference(&self) -> &str;

    /// Read the parameter's current value.
    fn read(&mut self) -> Result<f64>;
}

/// Source backed by a closure. Handy for tests and ad-hoc parameters.
pub struct FnSource<F> {
    reference: String,
    read: F,
}

impl<F> FnSource<F>
where
    F: FnMut() -> Result<f64> + Send,
{
    pub fn new(reference: impl Into<String>, read: F) -> Self {
        Self {
            reference: reference.into(),
            read,
        }
    }
}

impl<F> ParameterSource for FnSource<F>
where
    F: FnMut() -> Result<f64> + Send,
{
    fn reference(&self) -> &str {
        &self.reference
    }

    fn read(&mut self) -> Result<f64> {
        (self.read)()
    }
}

impl std::fmt::Debug for dyn ParameterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterSource")
            .field("reference", &self.reference())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SampleSetError;

    #[test]
    fn fn_source_forwards_reads() {
        let mut n = 0.0;
        let mut src = FnSource::new("Device.Counter", move || {
            n += 1.0;
            Ok(n)
        });
        assert_eq!(src.reference(), "Device.Counter");
        assert_eq!(src.read().ok(), Some(1.0));
        assert_eq!(src.read().ok(), Some(2.0));
    }

    #[test]
    fn fn_source_propagates_errors() {
        let mut src = FnSource::new("Device.Broken", || {
            Err(SampleSetError::Collection("offline".into()))
        });
        assert!(matches!(src.read(), Err(SampleSetError::Collection(_))));
    }
}
