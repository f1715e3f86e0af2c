use super::GeneratedCode;
use super::GenerationTicket;

pub enum Action {
    Cancel(),
    CopyCode(Vec<GeneratedCode>),
    Generate(GenerationTicket),
}
