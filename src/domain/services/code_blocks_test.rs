use anyhow::Result;
use test_utils::fenced_python_fixture;

use super::join_sources;
use super::strip_code_fence;
use super::CodeBlocks;
use crate::domain::models::Language;
use crate::domain::models::TranscriptEntry;

fn codeblocks() -> CodeBlocks {
    let entries = vec![
        TranscriptEntry::user("first"),
        TranscriptEntry::assistant_with_code("Done!", Language::Python, "print(1)"),
        TranscriptEntry::user("second"),
        TranscriptEntry::assistant_error("OpenAI API error: rate limited"),
        TranscriptEntry::user("third"),
        TranscriptEntry::assistant_with_code("Done!", Language::Lua, "print(2)"),
        TranscriptEntry::user("fourth"),
        TranscriptEntry::assistant_with_code("Done!", Language::Python, "print(3)"),
    ];

    let mut codeblocks = CodeBlocks::default();
    codeblocks.replace_from_transcript(&entries);
    return codeblocks;
}

fn select(args: &[&str]) -> Result<String> {
    let args = args.iter().map(|e| return e.to_string()).collect::<Vec<String>>();
    let blocks = codeblocks().select(&args)?;
    return Ok(join_sources(&blocks));
}

#[test]
fn it_strips_plain_fences() {
    assert_eq!(strip_code_fence("```\nprint(1)\n```"), "print(1)");
}

#[test]
fn it_strips_language_tagged_fences() {
    insta::assert_snapshot!(strip_code_fence(fenced_python_fixture()), @r###"
    def process_data(items):
        result = []
        for item in items:
            if item > 0:
                result.append(item * 2)
        return result
    "###);
}

#[test]
fn it_strips_surrounding_whitespace_first() {
    assert_eq!(strip_code_fence("\n  ```lua\nprint(1)\n```  \n"), "print(1)");
}

#[test]
fn it_leaves_unfenced_text() {
    assert_eq!(strip_code_fence("print(1)\nprint(2)"), "print(1)\nprint(2)");
}

#[test]
fn it_leaves_short_fenced_text() {
    assert_eq!(strip_code_fence("```print(1)\n```"), "```print(1)\n```");
}

#[test]
fn it_collects_code_from_transcript() {
    let codeblocks = codeblocks();
    assert_eq!(codeblocks.len(), 3);
    assert!(!codeblocks.is_empty());
}

#[test]
fn it_provides_last_codeblock() -> Result<()> {
    assert_eq!(select(&[])?, "print(3)");
    return Ok(());
}

#[test]
fn it_provides_first_codeblock() -> Result<()> {
    assert_eq!(select(&["1"])?, "print(1)");
    return Ok(());
}

#[test]
fn it_provides_listed_codeblocks() -> Result<()> {
    assert_eq!(select(&["1,3"])?, "print(1)\n\nprint(3)");
    return Ok(());
}

#[test]
fn it_provides_ranged_codeblocks() -> Result<()> {
    assert_eq!(select(&["2..3"])?, "print(2)\n\nprint(3)");
    return Ok(());
}

#[test]
fn it_keeps_languages() -> Result<()> {
    let blocks = codeblocks().select(&["2".to_string()])?;
    assert_eq!(blocks[0].language, Language::Lua);
    return Ok(());
}

#[test]
fn it_fails_out_of_bounds() {
    let err = select(&["4"]).unwrap_err();
    assert_eq!(err.to_string(), "4 is out of bounds.");
}

#[test]
fn it_fails_on_zero() {
    assert!(select(&["0"]).is_err());
}

#[test]
fn it_fails_on_garbage() {
    assert!(select(&["abc"]).is_err());
    assert!(select(&["3..1"]).is_err());
}

#[test]
fn it_fails_without_codeblocks() {
    let codeblocks = CodeBlocks::default();
    assert!(codeblocks.select(&[]).is_err());
}

#[test]
fn it_fails_on_chained_ranges() {
    let err = select(&["1..2..3"]).unwrap_err();
    assert_eq!(err.to_string(), "1..2..3 is not a valid range.");
}
