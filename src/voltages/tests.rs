// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::Write;

use tempfile::NamedTempFile;

use super::*;
use crate::decode::decode_word;

fn obs(n_antennas: u32, n_frequencies: u32, n_timesteps: u32) -> ObservationInfo {
    ObservationInfo {
        n_antennas,
        n_frequencies,
        n_polarisations: 2,
        n_timesteps,
        ..ObservationInfo::vcs()
    }
}

/// Deterministic pseudo-random bytes.
fn fake_raw(n_bytes: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..n_bytes)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

fn options(timesteps_per_read: usize) -> ReshapeOptions {
    ReshapeOptions {
        timesteps_per_read,
        ..Default::default()
    }
}

#[test]
fn test_worked_example() {
    let obs = obs(2, 1, 4);
    let raw = [0x21_u8; 16];
    let v = Voltages::from_packed_reader(&raw[..], &obs, 2, options(2)).unwrap();
    assert_eq!(v.integration_intervals(), 2);
    assert_eq!(v.len(), 2 * 2 * 1 * 2 * 2);
    assert_eq!(v.size(), 16);
    assert!(v
        .buffer()
        .as_slice()
        .unwrap()
        .iter()
        .all(|&s| s == Complex::new(1, 2)));

    for interval in 0..2 {
        for ant in 0..2 {
            for pol in 0..2 {
                assert_eq!(
                    v.at(interval, 0, ant, pol).unwrap(),
                    &[Complex::new(1, 2); 2]
                );
            }
        }
    }
}

#[test]
fn test_padding_is_zero() {
    // 5 timesteps in intervals of 2: the last interval has one real step.
    let obs = obs(2, 1, 5);
    let raw = [0x21_u8; 20];
    let v = Voltages::from_packed_reader(&raw[..], &obs, 2, options(1)).unwrap();
    assert_eq!(v.integration_intervals(), 3);
    assert_eq!(v.len(), 3 * 2 * 2 * 2);
    for ant in 0..2 {
        for pol in 0..2 {
            assert_eq!(
                v.at(2, 0, ant, pol).unwrap(),
                &[Complex::new(1, 2), Complex::new(0, 0)]
            );
        }
    }
}

#[test]
fn test_samples_land_at_the_right_index() {
    let obs = obs(3, 4, 6);
    let raw = fake_raw(6 * 4 * 3 * 2, 1);
    let v = Voltages::from_packed_reader(&raw[..], &obs, 4, options(3)).unwrap();
    let strides = v.strides();
    let data = v.buffer().as_slice().unwrap();
    for ts in 0..6 {
        for ch in 0..4 {
            for ant in 0..3 {
                let offset = (ts * 4 * 3 + ch * 3 + ant) * 2;
                let word = u16::from_le_bytes([raw[offset], raw[offset + 1]]);
                let [r0, i0, r1, i1] = decode_word(word);
                let (interval, step) = (ts / 4, ts % 4);
                assert_eq!(
                    data[strides.index(interval, ch, ant, 0, step)],
                    Complex::new(r0, i0)
                );
                assert_eq!(
                    data[strides.index(interval, ch, ant, 1, step)],
                    Complex::new(r1, i1)
                );
            }
        }
    }
}

#[test]
fn test_trailing_partial_read_is_dropped() {
    let obs = obs(2, 2, 10);
    // 10 timesteps of data, but reads are of 4 timesteps; the last 2
    // timesteps are never decoded.
    let raw = vec![0x11_u8; 10 * 2 * 2 * 2];
    let v = Voltages::from_packed_reader(&raw[..], &obs, 5, options(4)).unwrap();
    let strides = v.strides();
    let data = v.buffer().as_slice().unwrap();
    for ts in 0..10 {
        let expected = if ts < 8 {
            Complex::new(1, 1)
        } else {
            Complex::new(0, 0)
        };
        let (interval, step) = (ts / 5, ts % 5);
        assert_eq!(data[strides.index(interval, 1, 1, 1, step)], expected);
    }
}

#[test]
fn test_data_beyond_the_observation_is_ignored() {
    let obs = obs(2, 1, 4);
    let raw = [0x21_u8; 64];
    let v = Voltages::from_packed_reader(&raw[..], &obs, 4, options(2)).unwrap();
    assert_eq!(v.len(), 16);
    assert!(v
        .buffer()
        .as_slice()
        .unwrap()
        .iter()
        .all(|&s| s == Complex::new(1, 2)));
}

#[test]
fn test_sequential_and_parallel_are_identical() {
    for (n_ants, n_freqs, n_ts, n_int, tpr) in [
        (8, 4, 1000, 100, 100),
        (5, 3, 250, 100, 50),
        (2, 1, 7, 3, 2),
        (16, 16, 64, 1, 64),
    ] {
        let obs = obs(n_ants, n_freqs, n_ts);
        // Include a partial read at the end.
        let n_bytes = (n_ts as usize * n_freqs as usize * n_ants as usize * 2) + 3;
        let raw = fake_raw(n_bytes, n_ts as u64);

        let sequential = Voltages::from_packed_reader(&raw[..], &obs, n_int, options(tpr)).unwrap();
        let parallel =
            Voltages::from_packed_parallel(&raw, &obs, n_int, options(tpr), DecodeDevice::Cpu)
                .unwrap();
        assert_eq!(sequential.len(), parallel.len());
        assert_eq!(
            sequential.buffer().as_slice().unwrap(),
            parallel.buffer().as_slice().unwrap(),
            "{n_ants} {n_freqs} {n_ts} {n_int} {tpr}"
        );
    }
}

#[test]
#[ignore = "decodes a full VCS coarse channel (~1 GiB of memory)"]
fn test_sequential_and_parallel_are_identical_for_a_vcs_file() {
    let obs = ObservationInfo::vcs();
    let raw = fake_raw(10000 * 128 * 128 * 2, 42);
    let options = ReshapeOptions::default();
    let sequential = Voltages::from_packed_reader(&raw[..], &obs, 100, options).unwrap();
    let mut parallel =
        Voltages::from_packed_parallel(&raw, &obs, 100, options, DecodeDevice::pick()).unwrap();
    parallel.to_host().unwrap();
    assert_eq!(
        sequential.buffer().as_slice().unwrap(),
        parallel.buffer().as_slice().unwrap()
    );
}

#[test]
fn test_edge_channels_are_zeroed() {
    let obs = obs(2, 4, 4);
    let raw = vec![0x77_u8; 4 * 4 * 2 * 2];
    let options = ReshapeOptions {
        timesteps_per_read: 2,
        edge: 1,
        pinned: false,
    };
    let sequential = Voltages::from_packed_reader(&raw[..], &obs, 2, options).unwrap();
    let parallel =
        Voltages::from_packed_parallel(&raw, &obs, 2, options, DecodeDevice::Cpu).unwrap();
    for v in [&sequential, &parallel] {
        for interval in 0..2 {
            for ant in 0..2 {
                for pol in 0..2 {
                    assert_eq!(v.at(interval, 0, ant, pol).unwrap(), &[Complex::new(0, 0); 2]);
                    assert_eq!(v.at(interval, 1, ant, pol).unwrap(), &[Complex::new(7, 7); 2]);
                    assert_eq!(v.at(interval, 2, ant, pol).unwrap(), &[Complex::new(7, 7); 2]);
                    assert_eq!(v.at(interval, 3, ant, pol).unwrap(), &[Complex::new(0, 0); 2]);
                }
            }
        }
    }
}

#[test]
fn test_size_invariant() {
    for (n_ants, n_freqs, n_ts, n_int) in [
        (128_u32, 128_u32, 10000_u32, 100_u32),
        (2, 1, 4, 2),
        (2, 1, 5, 2),
        (3, 7, 11, 4),
        (256, 1, 262144, 1000),
    ] {
        let obs = obs(n_ants, n_freqs, n_ts);
        let expected = (n_ts as usize).div_ceil(n_int as usize)
            * n_int as usize
            * n_freqs as usize
            * n_ants as usize
            * 2;
        assert_eq!(Voltages::num_elements(&obs, n_int), expected);
    }
}

#[test]
fn test_from_memory() {
    let obs = ObservationInfo {
        n_polarisations: 2,
        ..obs(2, 2, 3)
    };
    // Each component is its own position in the input.
    let input: Vec<i8> = (0..obs.num_samples() * 2).map(|i| i as i8).collect();
    let v = Voltages::from_memory(&input, &obs, 2, false).unwrap();
    assert_eq!(v.len(), 2 * 2 * 2 * 2 * 2);
    let strides = v.strides();
    let data = v.buffer().as_slice().unwrap();
    let mut i = 0;
    for ts in 0..3 {
        for ch in 0..2 {
            for ant in 0..2 {
                for pol in 0..2 {
                    assert_eq!(
                        data[strides.index(ts / 2, ch, ant, pol, ts % 2)],
                        Complex::new(i as i8, i as i8 + 1)
                    );
                    i += 2;
                }
            }
        }
    }
    // The padded step of the last interval is zero.
    assert_eq!(v.at(1, 1, 1, 1).unwrap()[1], Complex::new(0, 0));
}

#[test]
fn test_from_memory_size_mismatch() {
    let obs = obs(2, 1, 4);
    let result = Voltages::from_memory(&[0; 31], &obs, 2, false);
    assert!(matches!(
        result,
        Err(VoltageError::SizeMismatch {
            got: 31,
            expected: 32
        })
    ));
    let result = Voltages::from_memory(&[0; 33], &obs, 2, false);
    assert!(matches!(result, Err(VoltageError::SizeMismatch { .. })));
}

#[test]
fn test_from_eda2_file() {
    let obs = ObservationInfo {
        n_timesteps: 8,
        ..ObservationInfo::eda2()
    };
    let input: Vec<u8> = (0..obs.num_samples() * 2).map(|i| (i % 7) as u8).collect();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&input).unwrap();
    file.flush().unwrap();

    let from_file = Voltages::from_eda2_file(file.path(), &obs, 4, false).unwrap();
    let from_memory =
        Voltages::from_memory(bytemuck::cast_slice(&input), &obs, 4, false).unwrap();
    assert_eq!(
        from_file.buffer().as_slice().unwrap(),
        from_memory.buffer().as_slice().unwrap()
    );
}

#[test]
fn test_from_dat_file() {
    let obs = obs(4, 2, 20);
    let raw = fake_raw(20 * 2 * 4 * 2, 7);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&raw).unwrap();
    file.flush().unwrap();

    let options = options(10);
    let from_file = Voltages::from_dat_file(file.path(), &obs, 8, options).unwrap();
    let mut from_file_parallel =
        Voltages::from_dat_file_parallel(file.path(), &obs, 8, options).unwrap();
    from_file_parallel.to_host().unwrap();
    let from_memory = Voltages::from_packed_reader(&raw[..], &obs, 8, options).unwrap();
    assert_eq!(
        from_file.buffer().as_slice().unwrap(),
        from_memory.buffer().as_slice().unwrap()
    );
    assert_eq!(
        from_file_parallel.buffer().as_slice().unwrap(),
        from_memory.buffer().as_slice().unwrap()
    );
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = Voltages::from_dat_file(
        "/does/not/exist.dat",
        &ObservationInfo::vcs(),
        100,
        ReshapeOptions::default(),
    );
    match result {
        Err(VoltageError::Read { file, .. }) => {
            assert_eq!(file, std::path::PathBuf::from("/does/not/exist.dat"))
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_bad_configurations() {
    let raw = [0_u8; 16];
    let result = Voltages::from_packed_reader(&raw[..], &obs(2, 1, 4), 0, options(2));
    assert!(matches!(result, Err(VoltageError::ZeroIntegrationSteps)));

    let result = Voltages::from_packed_reader(&raw[..], &obs(2, 1, 4), 2, options(0));
    assert!(matches!(result, Err(VoltageError::ZeroTimestepsPerRead)));

    let three_pols = ObservationInfo {
        n_polarisations: 3,
        ..obs(2, 1, 4)
    };
    let result = Voltages::from_packed_parallel(&raw, &three_pols, 2, options(2), DecodeDevice::Cpu);
    assert!(matches!(
        result,
        Err(VoltageError::UnsupportedPolarisations(3))
    ));

    let result = Voltages::from_packed_reader(
        &raw[..],
        &obs(2, 3, 4),
        2,
        ReshapeOptions {
            edge: 2,
            ..options(2)
        },
    );
    assert!(matches!(result, Err(VoltageError::EdgeTooWide { .. })));

    let result = Voltages::from_packed_reader(&raw[..], &obs(0, 1, 4), 2, options(2));
    assert!(matches!(result, Err(VoltageError::ObsInfo(_))));
}

#[test]
fn test_new_checks_the_buffer_length() {
    let obs = obs(2, 1, 4);
    let buffer = MemoryBuffer::from_vec(vec![Complex::new(0, 0); 15]).unwrap();
    let result = Voltages::new(buffer, obs.clone(), 2);
    assert!(matches!(
        result,
        Err(VoltageError::BufferLength {
            got: 15,
            expected: 16
        })
    ));

    let buffer = MemoryBuffer::from_vec(vec![Complex::new(1, 1); 16]).unwrap();
    let v = Voltages::new(buffer, obs, 2).unwrap();
    let copy = v.try_clone().unwrap();
    assert_eq!(copy.buffer().as_slice().unwrap(), v.buffer().as_slice().unwrap());
    assert_ne!(copy.buffer().as_ptr(), v.buffer().as_ptr());
}

#[cfg(any(feature = "cuda", feature = "hip"))]
mod gpu {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_gpu_decode_matches_sequential() {
        for (n_ants, n_freqs, n_ts, n_int, tpr, edge) in [
            (8, 4, 1000, 100, 100, 0),
            (5, 3, 250, 100, 50, 0),
            (4, 8, 40, 3, 10, 2),
        ] {
            let obs = obs(n_ants, n_freqs, n_ts);
            let raw = fake_raw(n_ts as usize * n_freqs as usize * n_ants as usize * 2 + 5, 3);
            let options = ReshapeOptions {
                timesteps_per_read: tpr,
                edge,
                pinned: false,
            };
            let sequential = Voltages::from_packed_reader(&raw[..], &obs, n_int, options).unwrap();
            let mut gpu =
                Voltages::from_packed_parallel(&raw, &obs, n_int, options, DecodeDevice::Gpu)
                    .unwrap();
            assert!(gpu.buffer().is_on_device());
            gpu.to_host().unwrap();
            assert_eq!(
                sequential.buffer().as_slice().unwrap(),
                gpu.buffer().as_slice().unwrap()
            );
        }
    }
}
