//! Text boundary of the stax calculator: the parser consumes UTF-8 and
//! produces tagged objects, the renderer turns any object back into text.
//! Together they give the round-trip the rest of the system relies on:
//! `parse(render(x))` reproduces `x` for canonical objects.

pub mod parse;
pub mod render;

pub use parse::{parse, parse_program, parse_source, Parser};
pub use render::{render, render_with_interrupt, Renderer};
