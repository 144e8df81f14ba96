//! Integration tests for the `example run` command.
use gridlink::cli::RunOpts;
use gridlink::cli::example::handle_example_run_command;
use gridlink::settings::Settings;
use std::fs;
use tempfile::tempdir;

/// Run the relaxed example, in which one site cannot be connected.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("GRIDLINK_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        ..RunOpts::default()
    };
    handle_example_run_command("relaxed", &opts, Some(Settings::default())).unwrap();

    let unconnected =
        fs::read_to_string(tempdir.path().join("unconnected_sites.csv")).unwrap();
    assert_eq!(unconnected, "site_id,capacity\noffshore,2500.0\n");

    let summary: toml::Table =
        toml::from_str(&fs::read_to_string(tempdir.path().join("summary.toml")).unwrap())
            .unwrap();
    assert_eq!(summary["mode"].as_str(), Some("relaxed"));
    assert_eq!(summary["totals"]["num_connections"].as_integer(), Some(3));
}
