use std::env;
use std::fs::read_dir;
use std::process::Command;
use std::time::Instant;

const CORE_COUNTS: [usize; 3] = [1, 2, 4];

fn main() {
	let mut arguments = env::args().skip(1);
	let graph_directory = arguments.next().unwrap_or_else(|| "../test-graphs".to_string());
	let processors: Vec<usize> = arguments.map(|argument| argument.parse().unwrap()).collect();
	let processors = if processors.is_empty() { vec![2, 4] } else { processors };

	let mut graph_files: Vec<_> = read_dir(&graph_directory).unwrap().map(
		|entry| entry.unwrap().path()
	).filter(|path| {
		let name = path.file_name().unwrap().to_str().unwrap();
		name.ends_with(".dot") && !name.ends_with("-output.dot")
	}).collect();
	graph_files.sort();

	let mut total_runs = 0;
	let mut disagreements = 0;
	for graph_file in &graph_files {
		for num_processors in &processors {
			let mut reference_makespan = None;
			for num_cores in CORE_COUNTS {
				let start_time = Instant::now();
				let output = Command::new("../target/release/optimal-scheduler")
					.arg(graph_file)
					.arg(format!("{}", num_processors))
					.arg("--parallel").arg(format!("{}", num_cores))
					.arg("--output").arg(env::temp_dir().join("benchmark-output.dot"))
					.output().unwrap();
				let spent_time = start_time.elapsed();
				if !output.status.success() {
					panic!("Failed to run optimal-scheduler {}", String::from_utf8(output.stderr).unwrap());
				}

				let makespan = parse_makespan(&String::from_utf8(output.stdout).unwrap());
				println!(
					"{} on {} processors with {} cores: makespan {} in {} ms",
					graph_file.display(), num_processors, num_cores, makespan, spent_time.as_millis()
				);
				match reference_makespan {
					None => reference_makespan = Some(makespan),
					Some(reference) if reference != makespan => {
						println!("    expected makespan {}", reference);
						disagreements += 1;
					}
					Some(_) => {}
				}
				total_runs += 1;
			}
		}
	}

	println!("Finished {} runs with {} disagreements", total_runs, disagreements);
}

fn parse_makespan(stdout: &str) -> u64 {
	let line = stdout.lines().find(|line| line.starts_with("Makespan: ")).unwrap();
	let value = &line["Makespan: ".len()..];
	let end_index = value.find(' ').unwrap_or(value.len());
	value[..end_index].parse().unwrap()
}
