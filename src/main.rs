extern crate structopt;
extern crate structopt_derive;
use structopt::StructOpt;

use delaunay_quality::json_io;
use delaunay_quality::planar::refine_procedures::quality;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "delaunay-quality",
    version = "0.1.0",
    about = "Quality refinement of constrained Delaunay triangulations"
)]
pub struct CliOptions {
    #[structopt(short, long, help = "input filename")]
    input: String,

    #[structopt(short, long, help = "output filename")]
    output: Option<String>,

    #[structopt(short, long, help = "log refinement diagnostics")]
    verbose: bool,
}

fn main() {
    let options: CliOptions = CliOptions::from_args();

    let mut builder = env_logger::Builder::from_default_env();
    if options.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let input_path = std::path::Path::new(&options.input);
    let input = match json_io::io::read(input_path) {
        Some(input) => input,
        None => {
            panic!("Failed to deserialize the triangulation input data");
        }
    };

    let mut params = input.refine_params();
    params.verbose = options.verbose;

    let mut mesh = input.build();
    let report = match quality::enforce_quality(&mut mesh, &params) {
        Ok(report) => report,
        Err(error) => {
            panic!("Refinement failed: {}", error);
        }
    };

    log::info!(
        "Inserted {} Steiner points; smallest angle {:.3} degrees.",
        report.steiner_points,
        mesh.smallest_angle()
    );

    let output =
        json_io::models::TriangulationOutput::from_triangulation(&mesh, &report);
    let output_string = serde_json::to_string_pretty(&output).unwrap();

    if let Some(output_path_string) = options.output {
        let output_path = std::path::Path::new(&output_path_string);
        match json_io::io::write(&output_path, output_string) {
            Ok(_) => {}
            Err(_) => {
                panic!("Failed to write the triangulation output to file");
            }
        }
    } else {
        println!("{}", output_string);
    }
}
