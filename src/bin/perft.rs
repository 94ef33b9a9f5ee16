/*
  Tabiya, a chess analysis-board core.
  Copyright (C) 2024 The Tabiya Authors.

  Tabiya is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Tabiya is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! The perft harness: count move-tree leaves for a position at increasing
//! depths, printing the totals and the generation speed. Comparing the
//! totals against published reference counts is how the move generator is
//! validated.

use clap::{value_parser, Arg, Command};

use tabiya::perft::perft;

use std::time::Instant;

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn main() {
    env_logger::init();

    let matches = Command::new("perft")
        .about("Move-tree enumeration for verifying legal move generation")
        .arg(
            Arg::new("fen")
                .short('f')
                .long("fen")
                .value_name("FEN")
                .help("The position to search from")
                .default_value(STARTPOS),
        )
        .arg(
            Arg::new("depth")
                .short('d')
                .long("depth")
                .value_name("plies")
                .help("The maximum depth to search to")
                .value_parser(value_parser!(u8))
                .default_value("5"),
        )
        .get_matches();

    let fen = matches.get_one::<String>("fen").unwrap();
    let max_depth = *matches.get_one::<u8>("depth").unwrap();

    println!("perft of [{fen}]");

    let mut total_nodes = 0;
    let tic = Instant::now();
    for depth in 1..=max_depth {
        let nodes = perft(fen, depth);
        total_nodes += nodes;
        println!("  depth {depth}: {nodes}");
    }
    let seconds = tic.elapsed().as_secs_f64();

    #[allow(clippy::cast_precision_loss)]
    let speed = total_nodes as f64 / seconds;
    println!("{total_nodes} nodes in {seconds:.2} secs: {speed:.0} nodes/sec");
}
