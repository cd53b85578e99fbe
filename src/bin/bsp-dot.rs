// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software
// and associated documentation files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

extern crate docopt;
extern crate env_logger;
#[macro_use]
extern crate serde_derive;
extern crate vbsp_import;

use std::process::exit;

use vbsp_import::common::{bsp, config::BspImportConfig};

use docopt::Docopt;

#[derive(Deserialize)]
struct Args {
    arg_file: String,
    flag_node: Option<usize>,
    flag_help: bool,
}

const USAGE: &'static str = "
Usage: bsp-dot [options] <file>

Prints the node tree of a map as a Graphviz graph.

Options:
    -n, --node <id>  Start from the given node instead of the root.
    -h, --help       Show this message and exit.
";

fn main() {
    env_logger::init();

    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if args.flag_help {
        println!("{}", USAGE);
        exit(0);
    }

    let data = match bsp::load_file(&args.arg_file, &BspImportConfig::default()) {
        Ok(d) => d,
        Err(why) => {
            eprintln!("Couldn't load {}: {}", args.arg_file, why);
            exit(1);
        }
    };

    println!("{}", data.gen_dot_graph(args.flag_node.unwrap_or(0)));
}
