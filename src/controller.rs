use crate::error::EnhanceError;

/// A page enhancement with an explicit lifecycle.
///
/// `start` wires listeners, observers and initial styles. `stop` detaches all of
/// them and cancels pending timers and animation frames; calling it twice is a no-op.
pub trait Controller {
    fn name(&self) -> &'static str;
    fn start(&mut self) -> Result<(), EnhanceError>;
    fn stop(&mut self);
}
