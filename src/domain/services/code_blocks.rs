use anyhow::anyhow;
use anyhow::Result;

use crate::domain::models::GeneratedCode;
use crate::domain::models::TranscriptEntry;

#[cfg(test)]
#[path = "code_blocks_test.rs"]
mod tests;

/// Removes a wrapping markdown fence from model output. When the text opens
/// with a fence marker, the first and last lines are dropped. Anything else is
/// returned trimmed but otherwise untouched.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let lines = trimmed.split('\n').collect::<Vec<&str>>();
    if lines.len() <= 2 {
        return trimmed.to_string();
    }

    return lines[1..lines.len() - 1].join("\n");
}

/// Code payloads from the transcript, addressable by their 1-based index.
#[derive(Default)]
pub struct CodeBlocks {
    codeblocks: Vec<GeneratedCode>,
}

impl CodeBlocks {
    pub fn replace_from_transcript(&mut self, entries: &[TranscriptEntry]) {
        self.codeblocks = entries
            .iter()
            .filter_map(|entry| {
                return entry.code().cloned();
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        return self.codeblocks.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.codeblocks.is_empty();
    }

    /// Resolves arguments such as `1`, `1,3,5` or `2..4` to code blocks. No
    /// arguments selects the latest block.
    pub fn select(&self, args: &[String]) -> Result<Vec<GeneratedCode>> {
        let latest = match self.codeblocks.last() {
            Some(latest) => latest,
            None => return Err(anyhow!("There is no generated code yet.")),
        };

        let args = args
            .iter()
            .map(|e| return e.trim().to_string())
            .filter(|e| return !e.is_empty())
            .collect::<Vec<String>>();

        if args.is_empty() {
            return Ok(vec![latest.clone()]);
        }

        let mut indexes = vec![];
        for arg in args.iter() {
            for e in arg.split(',') {
                let trimmed = e.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.contains("..") {
                    let split = trimmed.split("..").collect::<Vec<&str>>();
                    if split.len() != 2 {
                        return Err(anyhow!(format!("{trimmed} is not a valid range.")));
                    }
                    let first = parse_index(split[0])?;
                    let last = parse_index(split[1])?;
                    if first > last {
                        return Err(anyhow!(format!("{trimmed} is not a valid range.")));
                    }

                    indexes.extend(first..=last);
                } else {
                    indexes.push(parse_index(trimmed)?);
                }
            }
        }

        for index in indexes.iter() {
            if self.codeblocks.get(*index).is_none() {
                return Err(anyhow!(format!("{} is out of bounds.", index + 1)));
            }
        }

        let res = indexes
            .iter()
            .map(|idx| return self.codeblocks[*idx].clone())
            .collect::<Vec<GeneratedCode>>();

        return Ok(res);
    }
}

fn parse_index(text: &str) -> Result<usize> {
    let idx = text
        .trim()
        .parse::<usize>()
        .map_err(|_| return anyhow!(format!("{text} is not a code block number.")))?;
    if idx == 0 {
        return Err(anyhow!("Code block numbers start at 1."));
    }

    return Ok(idx - 1);
}

pub fn join_sources(blocks: &[GeneratedCode]) -> String {
    return blocks
        .iter()
        .map(|block| return block.source.to_string())
        .collect::<Vec<String>>()
        .join("\n\n");
}
