use std::fmt::Write;
use std::fs;

use crate::error::SchedulerError;
use crate::graph::TaskGraph;
use crate::search::ScheduleResult;

fn escape(text: &str) -> String {
	text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn format_id(id: &str) -> String {
	if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		id.to_string()
	} else {
		format!("\"{}\"", escape(id))
	}
}

fn write_dot(graph: &TaskGraph, result: Option<&ScheduleResult>) -> String {
	let mut output = String::new();
	// Writing to a String can't fail
	let _ = writeln!(output, "digraph \"{}\" {{", escape(graph.get_name()));
	for task in graph.tasks() {
		let id = format_id(task.get_id());
		match result {
			Some(result) => {
				let placement = &result.tasks[task.get_index()];
				let _ = writeln!(
					output, "\t{}\t[Weight={},Start={},Processor={}];",
					id, task.get_weight(), placement.start_time, placement.processor
				);
			}
			None => {
				let _ = writeln!(output, "\t{}\t[Weight={}];", id, task.get_weight());
			}
		}
		for dependency in task.get_successors() {
			let _ = writeln!(
				output, "\t{} -> {}\t[Weight={}];",
				id, format_id(graph.task(dependency.get_destination()).get_id()), dependency.get_weight()
			);
		}
	}
	output.push_str("}\n");
	output
}

/// Formats `graph` as DOT, without schedule information
pub fn write_graph(graph: &TaskGraph) -> String {
	write_dot(graph, None)
}

/// Formats `graph` as DOT, annotating every task with its `Start` time and (1-indexed)
/// `Processor` from `result`
pub fn write_schedule(graph: &TaskGraph, result: &ScheduleResult) -> String {
	write_dot(graph, Some(result))
}

pub fn write_file(file_path: &str, contents: &str) -> Result<(), SchedulerError> {
	fs::write(file_path, contents).map_err(|error| SchedulerError::io(file_path, error))
}
