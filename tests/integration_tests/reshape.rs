// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{astroio, get_cmd_output, write_dat_file, VCS_BYTES_PER_TIMESTEP};

#[test]
fn test_reshape_dat_file() {
    let tmp_dir = TempDir::new().unwrap();
    let input = write_dat_file(tmp_dir.path(), 4, 0x21);
    let output = tmp_dir.path().join("voltages.bin");

    #[rustfmt::skip]
    let cmd = astroio()
        .args([
            "reshape", &input,
            "--output", &output.display().to_string(),
            "--integration-steps", "2",
            "--timesteps", "4",
            "--timesteps-per-read", "2",
        ])
        .ok();
    assert!(cmd.is_ok(), "reshape failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("astroio reshape complete."));

    // Each packed byte becomes a (real, imaginary) pair.
    let dumped = std::fs::read(&output).unwrap();
    assert_eq!(dumped.len(), 4 * VCS_BYTES_PER_TIMESTEP * 2);
    assert!(dumped.chunks_exact(2).all(|re_im| re_im == [1, 2]));
}

#[test]
fn test_reshape_parallel_matches_streaming() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("1313388760_1313388762_ch144.dat");
    // Three whole reads of 2 timesteps and a partial one that's dropped.
    let raw: Vec<u8> = (0..7 * VCS_BYTES_PER_TIMESTEP)
        .map(|i| (i % 253) as u8)
        .collect();
    std::fs::write(&input, raw).unwrap();

    let mut dumps = vec![];
    for parallel in [false, true] {
        let output = tmp_dir.path().join(format!("voltages_{parallel}.bin"));
        let mut cmd = astroio();
        cmd.args([
            "reshape",
            &input.display().to_string(),
            "-o",
            &output.display().to_string(),
            "-n",
            "3",
            "--timesteps",
            "8",
            "--timesteps-per-read",
            "2",
        ]);
        if parallel {
            cmd.arg("--parallel");
        }
        let result = cmd.ok();
        assert!(result.is_ok(), "reshape failed: {}", result.err().unwrap());
        dumps.push(std::fs::read(&output).unwrap());
    }
    // 8 timesteps in intervals of 3 means 9 timesteps of space.
    assert_eq!(dumps[0].len(), 9 * VCS_BYTES_PER_TIMESTEP * 2);
    assert_eq!(dumps[0], dumps[1]);
}

#[test]
fn test_reshape_eda2() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("station.bin");
    let output = tmp_dir.path().join("voltages.bin");
    // 2 timesteps of 256 antennas, 1 channel, 2 pols and 2 components.
    let raw: Vec<u8> = (0..2 * 256 * 2 * 2).map(|i| (i % 100) as u8).collect();
    std::fs::write(&input, &raw).unwrap();

    #[rustfmt::skip]
    let cmd = astroio()
        .args([
            "reshape", &input.display().to_string(),
            "-o", &output.display().to_string(),
            "--telescope", "eda2",
            "--timesteps", "2",
            "-n", "2",
        ])
        .ok();
    assert!(cmd.is_ok(), "reshape failed: {}", cmd.err().unwrap());

    let dumped = std::fs::read(&output).unwrap();
    assert_eq!(dumped.len(), raw.len());
    // Antenna 0, pol 1: timestep 0 then timestep 1.
    assert_eq!(&dumped[4..8], &[raw[2], raw[3], raw[1024 + 2], raw[1024 + 3]]);
}

#[test]
fn test_reshape_dry_run_and_save_toml() {
    let tmp_dir = TempDir::new().unwrap();
    let input = write_dat_file(tmp_dir.path(), 1, 0);
    let output = tmp_dir.path().join("voltages.bin");
    let toml = tmp_dir.path().join("args.toml");

    #[rustfmt::skip]
    let cmd = astroio()
        .args([
            "reshape", &input,
            "-o", &output.display().to_string(),
            "-n", "7",
            "--dry-run",
            "--save-toml", &toml.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "reshape failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dry run"));
    assert!(!output.exists());

    let saved = std::fs::read_to_string(&toml).unwrap();
    assert!(saved.contains("integration_steps = 7"), "{saved}");

    // The saved arguments reproduce the run.
    #[rustfmt::skip]
    let cmd = astroio()
        .args(["reshape", "--args-file", &toml.display().to_string(), "--dry-run"])
        .ok();
    assert!(cmd.is_ok(), "reshape failed: {}", cmd.err().unwrap());
}

#[test]
fn test_reshape_without_output_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let input = write_dat_file(tmp_dir.path(), 1, 0);
    let cmd = astroio().args(["reshape", &input]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: No output file"), "{stderr}");
}

#[test]
fn test_reshape_missing_file_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("1313388760_1313388762_ch144.dat");
    let output = tmp_dir.path().join("voltages.bin");
    #[rustfmt::skip]
    let cmd = astroio()
        .args([
            "reshape", &input.display().to_string(),
            "-o", &output.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("1313388760_1313388762_ch144.dat"), "{stderr}");
}
