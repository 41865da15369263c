#![warn(missing_docs)]
//! mdedit-core - Headless Markdown Editing Kernel
//!
//! # Overview
//!
//! `mdedit-core` owns the state of an interactive Markdown editor and nothing else: document
//! text, cursor and selection, undo/redo history, incremental syntax tokenization, coordinate
//! mapping and theme lookup. Rendering, input handling and persistence belong to the host.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  EditorSession                              │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Cursor / Selection / History               │  ← Editing State
//! ├─────────────────────────────────────────────┤
//! │  IncrementalTokenizer (+ background batches)│  ← Syntax
//! ├─────────────────────────────────────────────┤
//! │  CoordinateMapper / StyleResolver           │  ← Presentation Helpers
//! ├─────────────────────────────────────────────┤
//! │  TextBuffer (Rope) + change notifications   │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use mdedit_core::{EditorConfig, EditorSession, Position, TokenKind};
//!
//! let mut session = EditorSession::from_text("# Title\nbody", EditorConfig::default());
//!
//! session.set_cursor(Position::new(1, 4), false);
//! session.insert_text(" **bold**");
//! assert_eq!(session.text(), "# Title\nbody **bold**");
//!
//! let tokens = session.line_tokens(1);
//! assert_eq!(tokens[1].kind, TokenKind::BoldDelimiter);
//!
//! session.undo();
//! assert_eq!(session.text(), "# Title\nbody");
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - Rope-backed line buffer
//! - [`events`] - Change subscriptions
//! - [`cursor`] / [`selection`] - Caret and anchor/focus selection
//! - [`history`] - Coalescing undo/redo stacks
//! - [`tokenizer`] - Incremental Markdown tokenizer and background batches
//! - [`coordinates`] - Position ↔ pixel mapping and viewport virtualization
//! - [`style`] - Themes and style resolution
//! - [`config`] - Tunables
//! - [`session`] - Everything above wired together
//!
//! # Unicode Support
//!
//! - Columns and token offsets count Unicode scalar values
//! - `\r\n` and `\r` are normalized to `\n` on input
//! - Word motion follows UAX #29 word boundaries; monospace widths follow UAX #11

pub mod buffer;
pub mod config;
pub mod coordinates;
pub mod cursor;
pub mod events;
pub mod history;
pub mod position;
pub mod selection;
pub mod session;
pub mod style;
pub mod tokenizer;

pub use buffer::{TextBuffer, normalize_line_breaks};
pub use config::EditorConfig;
pub use coordinates::{
    CoordinateMapper, MonospaceMeasure, Point, TextMeasure, VisibleRange, visible_range,
};
pub use cursor::CursorModel;
pub use events::{LineRange, SubscriptionId};
pub use history::{
    EditKind, HistoryManager, HistoryOperation, RecordOutcome, Replay, ReplayDirection,
};
pub use position::Position;
pub use selection::{OrderedRange, SelectionModel};
pub use session::{EditorSession, Motion};
pub use style::{Color, Style, StyleError, StyleResolver, Theme};
pub use tokenizer::{
    BoundedCache, EvictionPolicy, IncrementalTokenizer, LineResult, ParserContext, Token,
    TokenKind, TokenMeta, TokenizeBatch, TokenizeResult, TokenizerOptions, parse_line,
};
