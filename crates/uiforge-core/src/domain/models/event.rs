use super::GenerationError;

/// Completions reported back to the controller loop by spawned work.
#[derive(Debug)]
pub enum Event {
    GenerationFinished {
        attempt: u64,
        result: Result<String, GenerationError>,
    },
}
