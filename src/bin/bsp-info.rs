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
extern crate failure;
#[macro_use]
extern crate serde_derive;
extern crate vbsp_import;

use std::process::exit;

use vbsp_import::{
    common::config::ImportConfig,
    import::{mesh::MeshDescription, BspImporter, MeshSink, Placement, UnitKind},
};

use docopt::Docopt;
use failure::Error;

#[derive(Deserialize)]
struct Args {
    arg_file: String,
    flag_config: Option<String>,
    flag_geometry: bool,
    flag_help: bool,
    flag_version: bool,
}

const USAGE: &'static str = "
Usage: bsp-info [options] <file>

Options:
    -c, --config <file>  Read import settings from a RON file.
    -g, --geometry       Render the map and list the units it produces.

    -h, --help           Show this message and exit.
        --version        Print version information and exit.
";

const VERSION: &'static str = "
bsp-info 0.1
Copyright © 2018 Cormac O'Brien
Released under the terms of the MIT License
";

struct PrintSink;

impl MeshSink for PrintSink {
    type Unit = usize;

    fn begin_import(&mut self, map_name: &str, portable: bool) -> Result<(), Error> {
        println!("units of {} (portable: {}):", map_name, portable);
        Ok(())
    }

    fn create_unit(
        &mut self,
        name: &str,
        mesh: MeshDescription,
        placement: Placement,
        kind: UnitKind,
    ) -> Result<usize, Error> {
        let t = placement.translation;
        println!(
            "    {:<32} {:?} {} triangles, {} vertices, {} materials at ({:.1}, {:.1}, {:.1})",
            name,
            kind,
            mesh.triangle_count(),
            mesh.vertices.len(),
            mesh.materials.len(),
            t.x,
            t.y,
            t.z
        );
        Ok(mesh.triangle_count())
    }
}

fn main() {
    env_logger::init();

    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if args.flag_help {
        println!("{}", USAGE);
        exit(0);
    }

    if args.flag_version {
        println!("{}", VERSION);
        exit(0);
    }

    let config = match args.flag_config {
        Some(ref path) => match ImportConfig::load(path) {
            Ok(c) => c,
            Err(why) => {
                println!("Couldn't load settings from {}: {}", path, why);
                exit(1);
            }
        },
        None => ImportConfig::default(),
    };

    let importer = match BspImporter::load(&args.arg_file, config) {
        Ok(i) => i,
        Err(why) => {
            println!("Couldn't load {}: {}", args.arg_file, why);
            exit(1);
        }
    };

    let bsp = importer.bsp();
    println!(
        "{}: version {}, revision {}",
        importer.map_name(),
        bsp.version(),
        bsp.map_revision()
    );
    println!("    planes:       {}", bsp.planes().len());
    println!("    nodes:        {}", bsp.nodes().len());
    println!("    leaves:       {}", bsp.leaves().len());
    println!(
        "    faces:        {} ({} skipped)",
        bsp.faces().len(),
        bsp.skipped_faces()
    );
    println!("    brushes:      {}", bsp.brushes().len());
    println!("    models:       {}", bsp.models().len());
    println!("    displacements: {}", bsp.disp_infos().len());
    println!(
        "    static props: {}",
        bsp.static_props().map(|s| s.props.len()).unwrap_or(0)
    );
    println!(
        "    detail props: {}",
        bsp.detail_props().map(|d| d.objects.len()).unwrap_or(0)
    );

    for warning in bsp.warnings() {
        println!("warning: {}", warning);
    }

    if args.flag_geometry {
        let mut sink = PrintSink;
        match importer.import_geometry(&mut sink) {
            Ok(units) => println!("{} triangles total", units.iter().sum::<usize>()),
            Err(why) => {
                println!("Couldn't render {}: {}", importer.map_name(), why);
                exit(1);
            }
        }
    }
}
