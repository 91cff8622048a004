extern crate log;
extern crate pretty_env_logger;

use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{arg, command, value_parser, ArgMatches, Command};
use log::warn;

use omr_scoring::answer_key::AnswerKey;
use omr_scoring::interpret::{interpret_sheet_images, InterpretOptions};
use omr_scoring::report::SheetReport;

fn main() {
    pretty_env_logger::init_custom_env("LOG");

    let matches = cli().get_matches();
    let options = interpret_options(&matches);
    if let Err(e) = options.validate() {
        eprintln!("Error: {}", e);
        exit(1);
    }

    let answer_key_path = matches
        .get_one::<String>("key")
        .expect("answer key path is required");
    let answer_key = match AnswerKey::load(Path::new(answer_key_path)) {
        Ok(answer_key) => answer_key,
        Err(e) => {
            eprintln!("Error loading answer key: {}", e);
            exit(1);
        }
    };

    let image_paths = matches
        .get_many::<String>("images")
        .expect("at least one image path is required")
        .map(PathBuf::from)
        .collect::<Vec<PathBuf>>();

    let results = interpret_sheet_images(&image_paths, &answer_key, &options);
    let reports = image_paths
        .iter()
        .zip(results)
        .map(|(image_path, result)| {
            if let Err(e) = &result {
                warn!("skipping {}: {}", image_path.display(), e);
            }
            SheetReport::new(image_path, result)
        })
        .collect::<Vec<SheetReport>>();

    match serde_json::to_string_pretty(&reports) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error writing results: {}", e);
            exit(1);
        }
    }
}

fn interpret_options(matches: &ArgMatches) -> InterpretOptions {
    let mut options = InterpretOptions {
        debug: matches.get_flag("debug"),
        ..InterpretOptions::default()
    };

    if let Some(blur_kernel_size) = matches.get_one::<u32>("blur-kernel") {
        options.preprocess.blur_kernel_size = *blur_kernel_size;
    }
    if let Some(min_area) = matches.get_one::<u32>("min-area") {
        options.bubble_shape.min_area = *min_area;
    }
    if let Some(max_area) = matches.get_one::<u32>("max-area") {
        options.bubble_shape.max_area = *max_area;
    }
    if let Some(min_aspect) = matches.get_one::<f32>("min-aspect") {
        options.bubble_shape.min_aspect_ratio = *min_aspect;
    }
    if let Some(max_aspect) = matches.get_one::<f32>("max-aspect") {
        options.bubble_shape.max_aspect_ratio = *max_aspect;
    }
    if let Some(fill_threshold) = matches.get_one::<f32>("fill-threshold") {
        options.fill_threshold = *fill_threshold;
    }
    if let Some(options_per_question) = matches.get_one::<usize>("options-per-question") {
        options.options_per_question = *options_per_question;
    }

    options
}

#[allow(clippy::cognitive_complexity)]
fn cli() -> Command {
    command!()
        .arg(arg!(-k --key <PATH> "Path to answer key JSON file").required(true))
        .arg(arg!(-d --debug "Write annotated debug images next to each input image"))
        .arg(
            arg!(--"blur-kernel" <SIZE>
                "Gaussian smoothing kernel size, 0 to disable [default: 5]")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"min-area" <PIXELS>
                "Bubble bounding boxes must be larger than this [default: 400]")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"max-area" <PIXELS>
                "Bubble bounding boxes must be smaller than this [default: 2500]")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"min-aspect" <RATIO> "Smallest bubble width/height ratio [default: 0.8]")
                .value_parser(value_parser!(f32)),
        )
        .arg(
            arg!(--"max-aspect" <RATIO> "Largest bubble width/height ratio [default: 1.2]")
                .value_parser(value_parser!(f32)),
        )
        .arg(
            arg!(--"fill-threshold" <RATIO>
                "Ink fraction above which a bubble is filled [default: 0.5]")
                .value_parser(value_parser!(f32)),
        )
        .arg(
            arg!(--"options-per-question" <COUNT> "Bubbles per question [default: 4]")
                .value_parser(value_parser!(usize)),
        )
        .arg(arg!(images: <IMAGE> ... "Paths to bubble sheet images").required(true))
}
