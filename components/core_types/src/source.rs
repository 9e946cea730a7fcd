//! Source positions and stack frames parsed from engine stack traces.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static FRAME_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*at\s+(?:(?P<func>.*?)\s+\((?P<loc>[^()]*)\)|(?P<bare>\S+))\s*$")
        .expect("stack frame pattern is valid")
});

static FRAME_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<url>.*?)(?::(?P<line>\d+)(?::(?P<col>\d+))?)?$")
        .expect("stack location pattern is valid")
});

/// Represents a position in source code.
///
/// Lines and columns are 1-based, as the engine reports them.
///
/// # Examples
///
/// ```
/// use core_types::SourcePosition;
///
/// let pos = SourcePosition { line: 10, column: 5 };
/// assert_eq!(pos.line, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Line number
    pub line: u32,
    /// Column number
    pub column: u32,
}

/// Represents a single frame in a JavaScript call stack.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame::parse("    at myFunction (main.js:25:10)").unwrap();
///
/// assert_eq!(frame.function_name, Some("myFunction".to_string()));
/// assert_eq!(frame.source_url, Some("main.js".to_string()));
/// assert_eq!((frame.line, frame.column), (25, 10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Name of the function, or None for anonymous functions
    pub function_name: Option<String>,
    /// URL or file path of the source, or None for native frames
    pub source_url: Option<String>,
    /// Line number where the call occurred, 0 when unknown
    pub line: u32,
    /// Column number where the call occurred, 0 when unknown
    pub column: u32,
}

impl StackFrame {
    /// Parse one line of an engine stack trace.
    ///
    /// Accepts `at name (url:line:col)`, `at name (native)` and
    /// `at url:line:col`. Returns `None` for anything else, such as the
    /// leading `Error: message` line some engines include.
    pub fn parse(line: &str) -> Option<StackFrame> {
        let caps = FRAME_LINE.captures(line)?;

        let (function_name, location) = match (caps.name("func"), caps.name("loc")) {
            (Some(func), Some(loc)) => {
                let name = func.as_str().trim();
                let name = (!name.is_empty() && name != "<anonymous>").then(|| name.to_string());
                (name, loc.as_str())
            }
            _ => (None, caps.name("bare")?.as_str()),
        };

        let loc = FRAME_LOCATION.captures(location)?;
        let url = loc.name("url").map(|m| m.as_str()).unwrap_or_default();
        let number = |group: &str| {
            loc.name(group)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0)
        };

        Some(StackFrame {
            function_name,
            source_url: (!url.is_empty() && url != "native").then(|| url.to_string()),
            line: number("line"),
            column: number("col"),
        })
    }

    /// Whether this frame belongs to engine-native code.
    pub fn is_native(&self) -> bool {
        self.source_url.is_none()
    }
}
