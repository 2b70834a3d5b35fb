use std::borrow::Cow;
use std::fs::read_to_string;

use crate::error::{GraphError, SchedulerError};
use crate::graph::{TaskGraph, TaskGraphBuilder, Time};

fn parse_error(line: usize, message: String) -> GraphError {
	GraphError::Parse { line, message }
}

/// Returns the byte offset of the first `pattern` in `text` that is not inside a quoted id
fn find_outside_quotes(text: &str, pattern: &str) -> Option<usize> {
	let mut quoted = false;
	let mut escaped = false;
	for (index, c) in text.char_indices() {
		if quoted {
			if escaped {
				escaped = false;
			} else if c == '\\' {
				escaped = true;
			} else if c == '"' {
				quoted = false;
			}
		} else if c == '"' {
			quoted = true;
		} else if text[index ..].starts_with(pattern) {
			return Some(index);
		}
	}
	None
}

fn split_outside_quotes<'t>(text: &'t str, pattern: &str) -> Vec<&'t str> {
	let mut parts = Vec::new();
	let mut rest = text;
	while let Some(index) = find_outside_quotes(rest, pattern) {
		parts.push(&rest[.. index]);
		rest = &rest[index + pattern.len() ..];
	}
	parts.push(rest);
	parts
}

/// Strips the surrounding quotes of a quoted id, and resolves its `\"` and `\\` escapes
fn unquote(raw: &str) -> Cow<'_, str> {
	let trimmed = raw.trim();
	if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
		return Cow::Borrowed(trimmed);
	}
	let inner = &trimmed[1 .. trimmed.len() - 1];
	if !inner.contains('\\') {
		return Cow::Borrowed(inner);
	}

	let mut unescaped = String::with_capacity(inner.len());
	let mut chars = inner.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			unescaped.push(c);
			continue;
		}
		match chars.next() {
			Some(next @ ('"' | '\\')) => unescaped.push(next),
			Some(next) => {
				unescaped.push('\\');
				unescaped.push(next);
			}
			None => unescaped.push('\\'),
		}
	}
	Cow::Owned(unescaped)
}

/// Finds the `Weight` attribute in an attribute list like `Weight=5, Start=0`. Returns `None`
/// when the list has no weight.
fn parse_weight(attributes: &str, line: usize) -> Result<Option<Time>, GraphError> {
	let compact = attributes.split('=').map(str::trim).collect::<Vec<_>>().join("=");
	for attribute in compact.split(|c: char| c == ',' || c.is_whitespace()) {
		let Some((key, value)) = attribute.split_once('=') else { continue };
		if !unquote(key).eq_ignore_ascii_case("weight") {
			continue;
		}
		let value = unquote(value);
		return value.parse::<Time>().map(Some).map_err(
			|_| parse_error(line, format!("couldn't parse weight '{}'", value))
		);
	}
	Ok(None)
}

fn parse_header(header: &str) -> String {
	let rest = header.trim().trim_start_matches("strict").trim();
	let rest = rest.trim_start_matches("digraph").trim();
	unquote(rest).into_owned()
}

fn parse_statement(
	statement: &str, line: usize, builder: &mut TaskGraphBuilder
) -> Result<(), GraphError> {
	let (target, attributes) = match find_outside_quotes(statement, "[") {
		Some(open) => {
			let close = statement.rfind(']').filter(|close| *close > open).ok_or_else(
				|| parse_error(line, "unterminated attribute list".to_string())
			)?;
			(&statement[.. open], &statement[open + 1 .. close])
		}
		None => (statement, ""),
	};

	let target = target.trim();
	if target.is_empty() || ["graph", "node", "edge"].contains(&target) {
		return Ok(());
	}
	let weight = parse_weight(attributes, line)?;

	if find_outside_quotes(target, "->").is_some() {
		let chain: Vec<Cow<str>> = split_outside_quotes(target, "->").into_iter().map(unquote).collect();
		if chain.iter().any(|id| id.is_empty()) {
			return Err(parse_error(line, format!("malformed dependency '{}'", target)));
		}
		for pair in chain.windows(2) {
			builder.add_dependency(&pair[0], &pair[1], weight.unwrap_or(0))?;
		}
	} else {
		let id = unquote(target);
		let quoted = target.starts_with('"');
		if !quoted && (id.contains(char::is_whitespace) || id.contains('=')) {
			return Err(parse_error(line, format!("unexpected statement '{}'", target)));
		}
		let weight = weight.ok_or_else(
			|| parse_error(line, format!("task '{}' has no Weight attribute", id))
		)?;
		builder.add_task(&id, weight)?;
	}
	Ok(())
}

/// Parses a task graph in the DOT dialect used by the scheduling benchmarks:
///
/// ```text
/// digraph "name" {
/// 	a	[Weight=2];
/// 	a -> b	[Weight=1];
/// 	b	[Weight=3];
/// }
/// ```
///
/// Every task needs a `Weight`. Dependencies without a `Weight` have no communication cost.
pub fn parse_graph(text: &str) -> Result<TaskGraph, GraphError> {
	let mut builder = TaskGraphBuilder::new("");
	let mut inside_body = false;
	let mut closed = false;

	for (line_index, raw_line) in text.lines().enumerate() {
		let line_number = line_index + 1;
		let mut line = match find_outside_quotes(raw_line, "//") {
			Some(comment) => &raw_line[.. comment],
			None => raw_line,
		}.trim();
		if line.is_empty() { continue; }
		if closed {
			return Err(parse_error(line_number, "content after the closing brace".to_string()));
		}

		if !inside_body {
			let Some(open) = find_outside_quotes(line, "{") else {
				return Err(parse_error(line_number, format!("expected a digraph header, found '{}'", line)));
			};
			builder.set_name(&parse_header(&line[.. open]));
			inside_body = true;
			line = &line[open + 1 ..];
		}

		if let Some(close) = find_outside_quotes(line, "}") {
			closed = true;
			if !line[close + 1 ..].trim().is_empty() {
				return Err(parse_error(line_number, "content after the closing brace".to_string()));
			}
			line = &line[.. close];
		}

		for statement in split_outside_quotes(line, ";") {
			parse_statement(statement, line_number, &mut builder)?;
		}
	}

	if !closed {
		return Err(parse_error(text.lines().count(), "missing closing brace".to_string()));
	}
	builder.build()
}

pub fn parse_graph_file(file_path: &str) -> Result<TaskGraph, SchedulerError> {
	let raw_text = read_to_string(file_path).map_err(|error| SchedulerError::io(file_path, error))?;
	Ok(parse_graph(&raw_text)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_simple_graph() {
		let graph = parse_graph(
			"digraph \"example\" {\n\ta\t[Weight=2];\n\ta -> b\t[Weight=1];\n\tb\t[Weight=3];\n}\n"
		).unwrap();
		assert_eq!("example", graph.get_name());
		assert_eq!(2, graph.num_tasks());
		assert_eq!(Some(0), graph.find_task("a"));
		assert_eq!(3, graph.task(1).get_weight());
		assert_eq!(1, graph.dependencies().len());
		assert_eq!(1, graph.dependencies()[0].get_weight());
	}

	#[test]
	fn test_relaxed_syntax() {
		let text = "// generated\n\
			digraph G { graph [rankdir=LR]; \"task one\" [label=x, Weight = 4]\n\
			\n\
			\"task one\" -> two -> three [ Weight=7 ]; two [Weight=1]; three [Weight=2, Start=0]\n\
			three -> four; four [Weight=0]; }";
		let graph = parse_graph(text).unwrap();
		assert_eq!("G", graph.get_name());
		assert_eq!(4, graph.num_tasks());
		assert_eq!(4, graph.task(0).get_weight());
		assert_eq!("task one", graph.task(0).get_id());
		let weights: Vec<_> = graph.dependencies().iter().map(|d| d.get_weight()).collect();
		assert_eq!(vec![7, 7, 0], weights);
	}

	#[test]
	fn test_quotes_hide_separators() {
		let text = "digraph \"a // b\" {\n\
			\t\"x; y\" [Weight=2]; // trailing comment\n\
			\t\"say \\\"hi\\\"\" [Weight=3];\n\
			\t\"x; y\" -> \"say \\\"hi\\\"\" [Weight=1];\n\
			}";
		let graph = parse_graph(text).unwrap();
		assert_eq!("a // b", graph.get_name());
		assert_eq!(2, graph.num_tasks());
		assert_eq!("x; y", graph.task(0).get_id());
		assert_eq!("say \"hi\"", graph.task(1).get_id());
		assert_eq!(1, graph.dependencies().len());
		assert_eq!(1, graph.dependencies()[0].get_weight());

		assert_eq!("back\\slash", unquote("\"back\\\\slash\""));
		assert_eq!("plain", unquote("  plain "));
	}

	#[test]
	fn test_errors_have_line_numbers() {
		let missing_weight = parse_graph("digraph g {\n\ta [Weight=1];\n\tb;\n}");
		assert!(matches!(missing_weight, Err(GraphError::Parse { line: 3, .. })));

		let bad_weight = parse_graph("digraph g {\n\ta [Weight=x];\n}");
		assert!(matches!(bad_weight, Err(GraphError::Parse { line: 2, .. })));

		let no_header = parse_graph("a [Weight=1];");
		assert!(matches!(no_header, Err(GraphError::Parse { line: 1, .. })));

		let unclosed = parse_graph("digraph g {\n\ta [Weight=1];");
		assert!(matches!(unclosed, Err(GraphError::Parse { line: 2, .. })));

		let trailing = parse_graph("digraph g {\n}\nb [Weight=1];");
		assert!(matches!(trailing, Err(GraphError::Parse { line: 3, .. })));

		let cyclic = parse_graph("digraph g {\na [Weight=1];\nb [Weight=1];\na -> b;\nb -> a;\n}");
		assert!(matches!(cyclic, Err(GraphError::Cycle(_))));
	}

	#[test]
	fn test_fixture_files() {
		let graph = parse_graph_file("./test-graphs/out-tree-11.dot").unwrap();
		assert_eq!(11, graph.num_tasks());
		assert_eq!(10, graph.dependencies().len());
		assert_eq!(640, graph.total_weight());

		let random = parse_graph_file("./test-graphs/random-10.dot").unwrap();
		assert_eq!(10, random.num_tasks());
		assert_eq!(19, random.dependencies().len());
		assert_eq!(51, random.total_weight());

		assert!(matches!(
			parse_graph_file("./test-graphs/does-not-exist.dot"),
			Err(SchedulerError::Io { .. })
		));
	}
}
