// Copyright 2021 by Michael Thies <mail@mhthies.de>
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with
// the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the
// specific language governing permissions and limitations under the License.

use std::fs::File;

use log::{debug, error, info, warn};

fn main() {
    // Setup logging & parse command line arguments
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!(
        "This is the all-2-clubs enumerator (twoclubs), version {}",
        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")
    );
    let args = parse_cli_args();

    // Hub division: one entry per hub, each entry is that hub's worker count
    let hub_division: Vec<usize> = match args.get_many::<usize>("HUBS") {
        Some(values) => values.copied().collect(),
        None => vec![num_cpus::get()],
    };
    if hub_division.iter().any(|&workers| workers == 0) {
        error!("Every hub needs at least one worker.");
        std::process::exit(exitcode::USAGE);
    }

    // Open and read the graph file
    let inpath: &String = args.get_one("GRAPH").unwrap();
    debug!("Opening graph file {} ...", inpath);
    let file = File::open(inpath).unwrap_or_else(|e| {
        error!("Could not open graph file {}: {}", inpath, e);
        std::process::exit(exitcode::NOINPUT)
    });
    let mut graph = twoclubs::io::graphml::read(file).unwrap_or_else(|e| {
        error!("Could not read graph file {}: {}", inpath, e);
        std::process::exit(exitcode::DATAERR)
    });

    // With a borough file given, restrict the search to the selected borough subgraph
    if let Some(borough_path) = args.get_one::<String>("borough") {
        let number: usize = *args.get_one("borough_number").unwrap();
        debug!("Opening borough file {} ...", borough_path);
        let file = File::open(borough_path).unwrap_or_else(|e| {
            error!("Could not open borough file {}: {}", borough_path, e);
            std::process::exit(exitcode::NOINPUT)
        });
        let boroughs = twoclubs::io::boroughs::read(file).unwrap_or_else(|e| {
            error!("Could not read borough file {}: {}", borough_path, e);
            std::process::exit(exitcode::DATAERR)
        });
        let borough = boroughs.get(number).unwrap_or_else(|| {
            error!(
                "Borough {} does not exist; the file holds {} boroughs.",
                number,
                boroughs.len()
            );
            std::process::exit(exitcode::DATAERR)
        });
        info!(
            "Restricting the search to borough {} with {} edges.",
            number,
            borough.len()
        );
        graph = twoclubs::io::boroughs::to_graph(borough);
    }

    info!(
        "Searching 2-clubs among {} vertices and {} edges.",
        graph.node_count(),
        graph.edge_count()
    );
    if graph.node_count() == 0 {
        warn!("The graph is empty; an empty candidate file will be written.");
    }

    // Run the search
    let (elapsed, candidates) = twoclubs::club::find_candidates(
        &graph,
        &hub_division,
        *args.get_one("max_len").unwrap(),
    );
    info!(
        "Found {} candidate 2-clubs in {:.3}s.",
        candidates.len(),
        elapsed.as_millis() as f32 / 1000f32
    );

    // Write the candidate records
    let outpath: &String = args.get_one("output").unwrap();
    debug!("Writing candidate records to {} ...", outpath);
    match File::create(outpath) {
        Err(e) => {
            error!("Could not open output file {}: {}.", outpath, e);
            std::process::exit(exitcode::CANTCREAT);
        }
        Ok(file) => {
            if let Err(e) = twoclubs::io::candidates::write(file, &candidates) {
                error!("Could not write candidates to {}: {}.", outpath, e);
                std::process::exit(exitcode::IOERR);
            }
        }
    }
    info!(
        "Candidate records written to {}. Run the maximality filter (ams-cardinality) on them \
         to obtain the maximal 2-clubs.",
        outpath
    );

    if args.get_flag("print") {
        print!(
            "The candidates are:\n{}",
            twoclubs::io::format_candidates(&candidates, &graph)
        );
    }
}

/// Helper function to construct and execute parser for command line options
fn parse_cli_args() -> clap::ArgMatches {
    clap::command!()
        .arg(
            clap::Arg::new("GRAPH")
                .help("The GraphML file to search for 2-clubs")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("HUBS")
                .help(
                    "The hub division: one integer per hub, each the number of workers of that \
                     hub, e.g. `4 4 2` for three hubs with ten workers in total. Defaults to a \
                     single hub with one worker per detected CPU core.",
                )
                .value_parser(clap::value_parser!(usize))
                .num_args(0..)
                .index(2),
        )
        .arg(
            clap::Arg::new("borough")
                .short('b')
                .long("borough")
                .help(
                    "A borough decomposition file (JSON edge lists, largest borough first). \
                     The search runs on the selected borough subgraph instead of the full graph.",
                )
                .value_name("FILE"),
        )
        .arg(
            clap::Arg::new("borough_number")
                .short('n')
                .long("borough-number")
                .help("Which borough to search. 0 = largest.")
                .value_name("N")
                .default_value("0")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("The candidate record file to write")
                .value_name("FILE")
                .default_value("candidates.bin"),
        )
        .arg(
            clap::Arg::new("max_len")
                .short('l')
                .long("max-len")
                .help(
                    "Queue length at which hubs and workers hand surplus nodes back to their \
                     parent for rebalancing",
                )
                .value_name("N")
                .default_value("10")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("print")
                .short('p')
                .long("print")
                .help("Print the candidate 2-clubs to stdout in a human readable format")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches()
}
