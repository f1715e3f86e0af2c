use super::GenerationId;
use super::GenerationResult;

pub enum Event {
    GenerationFinished(GenerationId, GenerationResult),
    Notice(String),
    NoticeError(String),
}
