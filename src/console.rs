//! Line-oriented front end.
//!
//! Typed commands map onto [`ReaderCommand`]s; page, sentence and chapter
//! numbers are one-based here and converted to indices before they reach the
//! reader.

use novel_reader_core::playback::ReaderUpdate;
use novel_reader_core::reader::ReaderCommand;
use novel_reader_core::session::PageView;
use novel_reader_core::speech::voice_catalog;
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  p, play           toggle play/pause
  stop              stop reading
  skip              jump ahead
  next, prev        next/previous page
  next-chapter      next chapter
  prev-chapter      previous chapter
  chapter N         go to chapter N
  page N            go to page N of this chapter
  read N            read from sentence N of this page
  voice ID          select a voice (see `voices`)
  speed X, pitch X  set rate (0.5 to 2.0)
  open PATH         open a txt/epub/pdf/docx/rtf file
  paste TEXT        read pasted text
  sample            load the sample novel
  status            show position and settings
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(ReaderCommand),
    Help,
    Voices,
    Empty,
}

pub fn parse_line(line: &str) -> Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "p" | "play" | "pause" => ReaderCommand::TogglePlayPause,
        "stop" => ReaderCommand::Stop,
        "skip" => ReaderCommand::Skip,
        "next" | "n" => ReaderCommand::NextPage,
        "prev" => ReaderCommand::PreviousPage,
        "next-chapter" => ReaderCommand::NextChapter,
        "prev-chapter" => ReaderCommand::PreviousChapter,
        "chapter" => ReaderCommand::GoToChapter(one_based(verb, rest)?),
        "page" => ReaderCommand::GoToPage(one_based(verb, rest)?),
        "read" => ReaderCommand::ReadFromSentence(one_based(verb, rest)?),
        "voice" => ReaderCommand::SetVoice(required(verb, rest)?.to_string()),
        "speed" => ReaderCommand::SetSpeed(rate(verb, rest)?),
        "pitch" => ReaderCommand::SetPitch(rate(verb, rest)?),
        "open" => ReaderCommand::Open(PathBuf::from(required(verb, rest)?)),
        "paste" => ReaderCommand::Paste(rest.to_string()),
        "sample" => ReaderCommand::LoadSample,
        "status" => ReaderCommand::Status,
        "q" | "quit" | "exit" => ReaderCommand::Quit,
        "voices" => return Ok(Input::Voices),
        "help" | "?" => return Ok(Input::Help),
        other => return Err(format!("Unknown command: {other} (try `help`)")),
    };
    Ok(Input::Command(command))
}

fn required<'a>(verb: &str, rest: &'a str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("`{verb}` needs an argument"))
    } else {
        Ok(rest)
    }
}

fn one_based(verb: &str, rest: &str) -> Result<usize, String> {
    match required(verb, rest)?.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("`{verb}` expects a number starting at 1")),
    }
}

fn rate(verb: &str, rest: &str) -> Result<f32, String> {
    required(verb, rest)?
        .parse::<f32>()
        .map_err(|_| format!("`{verb}` expects a number such as 1.2"))
}

pub fn voices_text() -> String {
    voice_catalog()
        .iter()
        .map(|voice| format!("  {:<18} {} ({})", voice.id, voice.label, voice.provider))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text to print for an update, if any.
pub fn render(update: &ReaderUpdate) -> Option<String> {
    match update {
        ReaderUpdate::DocumentLoaded {
            source_name,
            chapters,
            words,
        } => Some(format!(
            "Opened {source_name}: {chapters} chapter(s), {words} words"
        )),
        ReaderUpdate::Page(view) => Some(render_page(view)),
        ReaderUpdate::Highlight(Some(text)) => Some(format!("> {text}")),
        ReaderUpdate::Highlight(None) | ReaderUpdate::Progress(_) => None,
        ReaderUpdate::State(state) => Some(format!("[{state}]")),
        ReaderUpdate::Status(status) => Some(status.clone()),
        ReaderUpdate::Notice(notice) => Some(notice.clone()),
        ReaderUpdate::Error(error) => Some(format!("Error: {error}")),
    }
}

fn render_page(view: &PageView) -> String {
    let mut out = format!(
        "== {} | {} ({}/{}) | page {}/{} ==",
        view.source_name,
        view.chapter_title,
        view.chapter_index + 1,
        view.chapter_count,
        view.page_index + 1,
        view.page_count,
    );
    for (i, sentence) in view.sentences.iter().enumerate() {
        out.push_str(&format!("\n[{}] {sentence}", i + 1));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> ReaderCommand {
        match parse_line(line) {
            Ok(Input::Command(command)) => command,
            other => panic!("expected a command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn numbers_are_one_based() {
        assert_eq!(command("chapter 2"), ReaderCommand::GoToChapter(1));
        assert_eq!(command("page 1"), ReaderCommand::GoToPage(0));
        assert_eq!(command("read 3"), ReaderCommand::ReadFromSentence(2));
        assert!(parse_line("page 0").is_err());
        assert!(parse_line("page").is_err());
    }

    #[test]
    fn arguments_keep_their_spacing() {
        assert_eq!(
            command("paste  Hello there.  "),
            ReaderCommand::Paste("Hello there.".to_string())
        );
        assert_eq!(
            command("open My Book.epub"),
            ReaderCommand::Open(PathBuf::from("My Book.epub"))
        );
    }

    #[test]
    fn simple_verbs() {
        assert_eq!(command("P"), ReaderCommand::TogglePlayPause);
        assert_eq!(command("speed 1.5"), ReaderCommand::SetSpeed(1.5));
        assert_eq!(command("quit"), ReaderCommand::Quit);
        assert_eq!(parse_line("   ").unwrap(), Input::Empty);
        assert_eq!(parse_line("voices").unwrap(), Input::Voices);
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn page_rendering_numbers_sentences() {
        let view = PageView {
            source_name: "book.txt".to_string(),
            chapter_title: "Chapter 1".to_string(),
            chapter_index: 0,
            chapter_count: 2,
            page_index: 0,
            page_count: 1,
            sentences: vec!["One.".to_string(), "Two.".to_string()],
            is_first_page: true,
            is_last_page: true,
            is_first_chapter: true,
            is_last_chapter: false,
        };
        let text = render(&ReaderUpdate::Page(view)).unwrap();
        assert!(text.starts_with("== book.txt | Chapter 1 (1/2) | page 1/1 =="));
        assert!(text.ends_with("[1] One.\n[2] Two."));
        assert_eq!(render(&ReaderUpdate::Highlight(None)), None);
    }
}
