use std::path::PathBuf;

use clap::Parser;
use ubuntu_image::{
    BuildCommand, Cli, ConfigError, DefaultSteps, GadgetYaml, ImageConfig, SavedState,
    SectorSize, Validated, VolumeKey,
};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("ubuntu-image").chain(args.iter().copied())).unwrap()
}

fn build(args: &[&str]) -> Result<ImageConfig, ConfigError> {
    match ImageConfig::create(&parse(args))? {
        Validated::Build(config) => Ok(config),
        Validated::Version => panic!("unexpected version request"),
    }
}

#[test]
fn snap_image_with_all_common_options() {
    let config = build(&[
        "snap",
        "pc-amd64.model",
        "--image-size",
        "512M",
        "--output-dir",
        "out",
        "--image-file-list",
        "images.txt",
        "--cloud-init",
        "user-data",
        "--hooks-directory",
        "hooks1,hooks2",
        "--hooks-directory",
        "hooks3",
        "--disk-info",
        "info",
        "-c",
        "candidate",
        "--sector-size",
        "4096",
        "--snap",
        "hello=edge",
        "-d",
    ])
    .unwrap();

    let common = &config.common;
    assert!(common.debug);
    assert_eq!(
        common.image_size.as_ref().and_then(|sizes| sizes.default_size()).map(|size| size.as_u64()),
        Some(536_870_912)
    );
    assert_eq!(common.output_dir, Some(PathBuf::from("out")));
    assert_eq!(common.image_file_list, Some(PathBuf::from("images.txt")));
    assert_eq!(common.cloud_init, Some(PathBuf::from("user-data")));
    assert_eq!(
        common.hooks_directories,
        vec![
            PathBuf::from("hooks1"),
            PathBuf::from("hooks2"),
            PathBuf::from("hooks3")
        ]
    );
    assert_eq!(common.disk_info, Some(PathBuf::from("info")));
    assert_eq!(common.channel.as_deref(), Some("candidate"));
    assert_eq!(common.sector_size, SectorSize::S4096);

    let BuildCommand::Snap(snap) = &config.command else {
        panic!("expected snap command");
    };
    assert_eq!(snap.model_assertion, Some(PathBuf::from("pc-amd64.model")));
    assert_eq!(snap.snaps[0].channel.as_deref(), Some("edge"));
}

#[test]
fn classic_image_defaults() {
    let config = build(&["classic", "image-definition.yaml"]).unwrap();
    assert_eq!(config.common.sector_size, SectorSize::S512);
    assert!(config.state_machine.cleanup_work_dir());
    assert!(matches!(config.command, BuildCommand::Classic(_)));
    assert_eq!(
        config.planned_steps(&DefaultSteps).last().map(String::as_str),
        Some("finish")
    );
}

#[test]
fn multi_volume_size() {
    let config = build(&["-i", "vol1:512M,vol2:1G", "snap", "pc.model"]).unwrap();
    let sizes = config.common.image_size.unwrap();
    assert_eq!(
        sizes.get(&VolumeKey::Name("vol1".into())).map(|size| size.as_u64()),
        Some(536_870_912)
    );
    assert_eq!(
        sizes.get(&VolumeKey::Name("vol2".into())).map(|size| size.as_u64()),
        Some(1_073_741_824)
    );
}

#[test]
fn size_is_checked_against_gadget_later() {
    let config = build(&["-i", "pc:1G,extra:1G", "snap", "pc.model"]).unwrap();
    let gadget = GadgetYaml::from_yaml("volumes:\n  pc:\n    bootloader: grub\n").unwrap();
    assert_eq!(
        config.common.resolve_image_sizes(&gadget),
        Err(ConfigError::UnknownVolumeName {
            volume: "extra".into()
        })
    );
}

#[test]
fn invalid_inputs() {
    assert!(matches!(
        build(&["-i", "5K", "snap"]),
        Err(ConfigError::InvalidSizeFormat { .. })
    ));
    assert!(matches!(
        build(&["-i", "vol1:1M,vol1:2M", "snap"]),
        Err(ConfigError::InvalidSizeFormat { .. })
    ));
    assert!(matches!(
        build(&["--sector-size", "1024", "snap"]),
        Err(ConfigError::InvalidSectorSize { .. })
    ));
    assert!(matches!(
        build(&["--until", "step3", "--thru", "step5", "snap"]),
        Err(ConfigError::ConflictingStepRange { .. })
    ));
    assert!(matches!(
        build(&["--until", "nope", "snap"]),
        Err(ConfigError::InvalidStepName { flag: "until", .. })
    ));
    assert_eq!(build(&["-d"]), Err(ConfigError::NoCommandSelected));
}

#[test]
fn step_range_bounds() {
    let config = build(&["snap", "--until", "load_gadget_yaml"]).unwrap();
    assert_eq!(
        config.planned_steps(&DefaultSteps),
        vec!["make_temporary_directories", "prepare_image"]
    );

    let config = build(&["snap", "--thru", "load_gadget_yaml"]).unwrap();
    assert_eq!(
        config.planned_steps(&DefaultSteps),
        vec!["make_temporary_directories", "prepare_image", "load_gadget_yaml"]
    );
}

#[test]
fn resume_from_work_dir() {
    let dir = tempfile::tempdir().unwrap();
    let work_dir = dir.path().to_str().unwrap();

    assert_eq!(
        build(&["snap", "-w", work_dir, "--resume"]),
        Err(ConfigError::ResumeWithoutState {
            work_dir: Some(dir.path().to_path_buf())
        })
    );

    SavedState { steps_completed: 3 }.write(dir.path()).unwrap();
    let config = build(&["snap", "-w", work_dir, "--resume"]).unwrap();
    assert!(config.state_machine.resume);
    assert!(!config.state_machine.cleanup_work_dir());
    assert_eq!(
        config.planned_steps(&DefaultSteps).first().map(String::as_str),
        Some("set_artifact_names")
    );

    for until in ["prepare_image", "set_artifact_names"] {
        assert!(matches!(
            build(&["snap", "-w", work_dir, "--resume", "--until", until]),
            Err(ConfigError::StepAlreadyCompleted { flag: "until", .. })
        ));
    }

    let config = build(&["snap", "-w", work_dir, "--resume", "--thru", "set_artifact_names"])
        .unwrap();
    assert_eq!(config.planned_steps(&DefaultSteps), vec!["set_artifact_names"]);
    assert!(build(&["snap", "-w", work_dir, "--resume", "--until", "make_disk"]).is_ok());
}

#[test]
fn version_wins_over_everything() {
    let cli = parse(&["--version", "--sector-size", "3", "--until", "x", "--resume"]);
    assert_eq!(ImageConfig::create(&cli), Ok(Validated::Version));
    assert!(ubuntu_image::version_text().starts_with("ubuntu-image "));
}

#[test]
fn building_twice_is_identical() {
    let args = [
        "classic",
        "def.yaml",
        "-i",
        "0:1G,1:2G",
        "--thru",
        "make_disk",
        "-w",
        "/tmp/ubuntu-image-work",
    ];
    assert_eq!(build(&args), build(&args));
}

#[test]
fn clap_rejects_unknown_flags() {
    assert!(Cli::try_parse_from(["ubuntu-image", "--bogus"]).is_err());
}
