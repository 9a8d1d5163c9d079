// Command-line configuration. Everything the tool needs is parsed once here
// and handed to constructors explicitly.

use std::path::PathBuf;
use std::time::Duration;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub camera: Option<CameraConfig>,
    pub scale: usize,
    pub bitmap_resolution: u32,
    pub video_timeout: Duration,
    pub out_dir: PathBuf,
    pub costumes: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
}

pub fn command() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("Capture stage and camera regions into sprite costumes.")
        .arg(
            Arg::new("camera")
                .long("camera")
                .value_name("INDEX")
                .help("Camera device index.")
                .value_parser(value_parser!(u32))
                .default_value("0"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PX")
                .help("Requested camera width.")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("640"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PX")
                .help("Requested camera height.")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("480"),
        )
        .arg(
            Arg::new("no-camera")
                .long("no-camera")
                .help("Run without a video device.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("scale")
                .long("scale")
                .value_name("N")
                .help("Window pixels per stage unit.")
                .value_parser(value_parser!(u32).range(1..=8))
                .default_value("2"),
        )
        .arg(
            Arg::new("bitmap-resolution")
                .long("bitmap-resolution")
                .value_name("N")
                .help("Costume pixels per stage unit for captures.")
                .value_parser(value_parser!(u32).range(1..=8))
                .default_value("2"),
        )
        .arg(
            Arg::new("video-timeout-ms")
                .long("video-timeout-ms")
                .value_name("MS")
                .help("How long a video capture waits for the device.")
                .value_parser(value_parser!(u64))
                .default_value("2000"),
        )
        .arg(
            Arg::new("out-dir")
                .long("out-dir")
                .value_name("DIR")
                .help("Where exported costumes are written.")
                .value_parser(value_parser!(PathBuf))
                .default_value("."),
        )
        .arg(
            Arg::new("costume")
                .long("costume")
                .value_name("PATH|DATA_URL")
                .help("Preload a costume (repeatable). The first replaces the default costume.")
                .action(ArgAction::Append),
        )
}

impl Config {
    pub fn from_args() -> Self {
        Self::from_matches(&command().get_matches())
    }

    pub fn from_matches(m: &ArgMatches) -> Self {
        // Every option below has a default_value, so get_one always has a value.
        let u32_arg = |id: &str| m.get_one::<u32>(id).copied().unwrap_or_default();

        let camera = (!m.get_flag("no-camera")).then(|| CameraConfig {
            index: u32_arg("camera"),
            width: u32_arg("width"),
            height: u32_arg("height"),
        });

        Self {
            camera,
            scale: u32_arg("scale").max(1) as usize,
            bitmap_resolution: u32_arg("bitmap-resolution").max(1),
            video_timeout: Duration::from_millis(
                m.get_one::<u64>("video-timeout-ms").copied().unwrap_or_default(),
            ),
            out_dir: m.get_one::<PathBuf>("out-dir").cloned().unwrap_or_default(),
            costumes: m
                .get_many::<String>("costume")
                .map(|v| v.cloned().collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let argv = std::iter::once("costume-capture").chain(args.iter().copied());
        Config::from_matches(&command().try_get_matches_from(argv).unwrap())
    }

    #[test]
    fn defaults() {
        let c = parse(&[]);
        assert_eq!(c.camera, Some(CameraConfig { index: 0, width: 640, height: 480 }));
        assert_eq!(c.scale, 2);
        assert_eq!(c.bitmap_resolution, 2);
        assert_eq!(c.video_timeout, Duration::from_secs(2));
        assert_eq!(c.out_dir, PathBuf::from("."));
        assert!(c.costumes.is_empty());
    }

    #[test]
    fn overrides_and_repeated_costumes() {
        let c = parse(&[
            "--no-camera",
            "--scale", "3",
            "--bitmap-resolution", "1",
            "--costume", "a.png",
            "--costume", "data:image/png;base64,AAAA",
        ]);
        assert_eq!(c.camera, None);
        assert_eq!(c.scale, 3);
        assert_eq!(c.bitmap_resolution, 1);
        assert_eq!(c.costumes, ["a.png", "data:image/png;base64,AAAA"]);
    }

    #[test]
    fn rejects_zero_scale() {
        assert!(command().try_get_matches_from(["x", "--scale", "0"]).is_err());
    }
}
