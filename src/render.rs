use std::fmt::Write;

use crate::graph::TaskGraph;
use crate::search::ScheduleResult;

/// Renders `result` as a text Gantt chart: 1 row for every processor that runs at least 1
/// task, listing its tasks in order of start time as `[start..finish) id`.
pub fn render_gantt(graph: &TaskGraph, result: &ScheduleResult) -> String {
	let num_rows = result.tasks.iter().map(|task| task.processor).max().unwrap_or(0);
	let mut rows = vec![Vec::new(); num_rows];
	for (index, task) in result.tasks.iter().enumerate() {
		if task.processor > 0 {
			rows[task.processor - 1].push(index);
		}
	}

	let label_width = num_rows.to_string().len() + 1;
	let mut output = String::new();
	for (processor, row) in rows.iter_mut().enumerate() {
		if row.is_empty() {
			continue;
		}
		row.sort_by_key(|task| (result.tasks[*task].start_time, *task));

		let mut line = format!("{:>width$} |", format!("P{}", processor + 1), width = label_width);
		for task in row.iter() {
			let start = result.tasks[*task].start_time;
			let finish = start + graph.task(*task).get_weight();
			let _ = write!(line, " [{}..{}) {}", start, finish, graph.task(*task).get_id());
		}
		output.push_str(&line);
		output.push('\n');
	}
	output
}
