//! End-to-end properties of the analysis pipeline on synthetic signals

use spek::analysis::{band_energies, classify, estimate_cutoff, BandPartition, Cutoff, Threshold};
use spek::spectrum::{FrameConfig, IntensityScale, PowerScaling, Stft, WindowType};
use spek::{analyze, AnalysisConfig, SpectrumError, Waveform};
use std::f64::consts::PI;

fn tone(freq: f64, amplitude: f64, sample_rate: u32, len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| amplitude * (2.0 * PI * freq * n as f64 / sample_rate as f64).sin())
        .collect()
}

/// Deterministic broadband noise (xorshift) in [-amplitude, amplitude]
fn noise(amplitude: f64, len: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            amplitude * ((state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0)
        })
        .collect()
}

/// Comb of equal-level sines every 250 Hz up to (not including) `cutoff_hz`
fn band_limited(len: usize, sample_rate: u32, cutoff_hz: f64) -> Vec<f64> {
    let step = 250.0;
    let mut out = vec![0.0; len];
    let mut freq = step;
    let mut k = 0u64;
    while freq < cutoff_hz {
        let phase = (k as f64 * 0.7).sin() * PI;
        for (n, o) in out.iter_mut().enumerate() {
            *o += 0.02 * (2.0 * PI * freq * n as f64 / sample_rate as f64 + phase).sin();
        }
        freq += step;
        k += 1;
    }
    out
}

#[test]
fn frame_count_matches_formula() {
    let sample_rate = 8000;
    for &(n, o) in &[(512usize, 256usize), (1024, 0), (300, 299), (2048, 1024)] {
        let frames = FrameConfig::new(n, o).unwrap();
        let mut stft = Stft::new(frames, WindowType::Hann, PowerScaling::Spectrum).unwrap();

        for len in [n, n + 1, 3 * n + 5, 20_000] {
            let spectra = stft.process(&vec![0.25; len], sample_rate).unwrap();
            assert_eq!(spectra.num_frames(), (len - n) / (n - o) + 1);
        }
    }
}

#[test]
fn frequency_axis_is_strictly_increasing() {
    for frame_size in [64usize, 255, 1000, 2048] {
        let config = AnalysisConfig {
            frame_size,
            overlap: frame_size / 2,
            ..Default::default()
        };
        let wave = Waveform::mono(noise(0.5, 10_000, 7), 22050).unwrap();
        let report = analyze(&wave, &config).unwrap();

        let freqs = report.spectrogram.frequencies().to_vec();
        assert_eq!(freqs.len(), frame_size / 2 + 1);
        assert!(freqs.windows(2).all(|w| w[1] > w[0]));

        let times = report.spectrogram.times().to_vec();
        assert!(times.windows(2).all(|w| w[1] > w[0]));

        assert_eq!(
            report.spectrogram.intensity().dim(),
            (freqs.len(), times.len())
        );
        assert!(report.spectrogram.intensity().iter().all(|v| v.is_finite()));
    }
}

#[test]
fn sine_peak_is_within_one_bin() {
    let sample_rate = 44100;
    for freq in [440.0, 1234.5, 5000.0, 15000.0] {
        let wave = Waveform::mono(tone(freq, 0.7, sample_rate, 44100), sample_rate).unwrap();
        let report = analyze(&wave, &AnalysisConfig::default()).unwrap();

        let avg = &report.average_intensity;
        let (peak, _) = avg
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        let peak_hz = report.spectrogram.frequencies()[peak];
        assert!(
            (peak_hz - freq).abs() <= report.spectrogram.bin_width_hz(),
            "freq={} peak={}",
            freq,
            peak_hz
        );
    }
}

#[test]
fn silence_has_no_cutoff() {
    let wave = Waveform::from_interleaved(vec![0.0; 2 * 44100], 2, 44100).unwrap();

    let report = analyze(&wave, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.cutoff, Cutoff::NotFound);
    assert_eq!(report.cutoff.hz(), 0.0);

    for threshold in [1e-12, 1e-3, 1.0] {
        let config = AnalysisConfig {
            decibels: false,
            ..Default::default()
        };
        let report = analyze(&wave, &config).unwrap();
        assert_eq!(
            estimate_cutoff(&report.spectrogram, Threshold::Power(threshold)).unwrap(),
            Cutoff::NotFound
        );
    }
}

#[test]
fn band_limited_signal_reports_its_cutoff() {
    let sample_rate = 44100;
    let limited = band_limited(sample_rate as usize * 2, sample_rate, 16000.0);

    let wave = Waveform::mono(limited, sample_rate).unwrap();
    let report = analyze(&wave, &AnalysisConfig::default()).unwrap();

    // Highest component is 15750 Hz; leakage stays within a few dozen bins
    let cutoff = report.cutoff.hz();
    assert!(cutoff >= 15750.0, "cutoff={}", cutoff);
    assert!(cutoff < 17000.0, "cutoff={}", cutoff);

    // Full-band noise reaches Nyquist
    let wave = Waveform::mono(noise(0.5, sample_rate as usize, 11), sample_rate).unwrap();
    let report = analyze(&wave, &AnalysisConfig::default()).unwrap();
    assert!(report.cutoff.hz() > 21000.0);
}

#[test]
fn energy_at_500hz_selects_lowest_band() {
    let sample_rate = 8000;
    let config = AnalysisConfig {
        frame_size: 256,
        overlap: 128,
        bands: vec![0.0, 1000.0, 2000.0],
        ..Default::default()
    };
    let wave = Waveform::mono(tone(500.0, 0.9, sample_rate, 8000), sample_rate).unwrap();
    let report = analyze(&wave, &config).unwrap();

    let band = report.dominant_band.unwrap();
    assert_eq!((band.low_hz, band.high_hz), (0.0, 1000.0));
    assert_eq!(band.index, 0);
}

#[test]
fn equal_band_energy_is_resolved_to_lower_band() {
    let bands = BandPartition::new(vec![0.0, 100.0, 200.0]).unwrap();
    let freqs = ndarray::array![50.0, 150.0];
    let levels = ndarray::array![-20.0, -20.0];
    let scale = IntensityScale::default();

    let energies = band_energies(freqs.view(), levels.view(), scale, &bands);
    assert_eq!(energies.energies()[0], energies.energies()[1]);

    for _ in 0..100 {
        assert_eq!(classify(freqs.view(), levels.view(), scale, &bands).index, 0);
    }
}

#[test]
fn malformed_bands_are_rejected() {
    for edges in [vec![1000.0], vec![2000.0, 1000.0]] {
        assert!(matches!(
            BandPartition::new(edges),
            Err(SpectrumError::InvalidBands { .. })
        ));

        let config = AnalysisConfig {
            bands: vec![2000.0, 1000.0],
            ..Default::default()
        };
        let wave = Waveform::mono(vec![0.0; 4096], 44100).unwrap();
        assert!(matches!(
            analyze(&wave, &config),
            Err(SpectrumError::InvalidBands { .. })
        ));
    }
}

#[test]
fn invalid_frame_config_names_the_parameters() {
    let wave = Waveform::mono(vec![0.0; 4096], 44100).unwrap();

    let err = analyze(
        &wave,
        &AnalysisConfig {
            frame_size: 0,
            overlap: 0,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("frame_size=0"));

    let err = analyze(
        &wave,
        &AnalysisConfig {
            frame_size: 1024,
            overlap: 2048,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SpectrumError::InvalidFrameConfig { frame_size: 1024, overlap: 2048, .. }
    ));
}

#[test]
fn two_sample_frames_need_a_window_with_energy() {
    let samples: Vec<f64> = (0..8000).map(|n| if n % 2 == 0 { 1.0 } else { -1.0 }).collect();
    let wave = Waveform::mono(samples, 8000).unwrap();

    for window in [WindowType::Hann, WindowType::Blackman] {
        let err = analyze(
            &wave,
            &AnalysisConfig {
                frame_size: 2,
                overlap: 0,
                window,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SpectrumError::InvalidFrameConfig { frame_size: 2, overlap: 0, .. }
        ));
    }

    // A window that keeps energy yields finite intensities and sees the Nyquist tone
    for decibels in [true, false] {
        let report = analyze(
            &wave,
            &AnalysisConfig {
                frame_size: 2,
                overlap: 0,
                window: WindowType::Rectangular,
                decibels,
                bands: vec![],
                ..Default::default()
            },
        )
        .unwrap();
        assert!(report.spectrogram.intensity().iter().all(|v| v.is_finite()));
        assert_eq!(report.cutoff.hz(), 4000.0);
    }
}

#[test]
fn threshold_under_the_floor_is_rejected() {
    let wave = Waveform::mono(vec![0.0; 8192], 44100).unwrap();
    let config = AnalysisConfig {
        threshold_db: -130.0,
        ..Default::default()
    };
    assert!(matches!(
        analyze(&wave, &config),
        Err(SpectrumError::InvalidConfig { field: "threshold_db", .. })
    ));
}

#[test]
fn raw_scaling_with_custom_floor() {
    let wave = Waveform::mono(tone(1000.0, 0.5, 16000, 16000), 16000).unwrap();
    let config = AnalysisConfig {
        scaling: "raw".parse().unwrap(),
        floor_db: -200.0,
        ..Default::default()
    };
    let report = analyze(&wave, &config).unwrap();

    assert_eq!(report.spectrogram.scale(), IntensityScale::Decibels { floor_db: -200.0 });
    assert!(report.spectrogram.intensity().iter().all(|&v| v >= -200.0));
    assert_eq!(report.dominant_band.unwrap().low_hz, 250.0);
}

#[test]
fn density_scaling_tracks_spectrum_scaling() {
    // Same signal, two normalizations: differ by a constant per-bin offset in dB
    let sample_rate = 32000;
    let wave = Waveform::mono(noise(0.3, 32000, 5), sample_rate).unwrap();

    let spectrum = analyze(&wave, &AnalysisConfig::default()).unwrap();
    let density = analyze(
        &wave,
        &AnalysisConfig {
            scaling: PowerScaling::Density,
            floor_db: -300.0,
            ..Default::default()
        },
    )
    .unwrap();

    let a = &spectrum.average_intensity;
    let b = &density.average_intensity;
    let offset = a[10] - b[10];
    for k in 1..a.len() - 1 {
        assert!((a[k] - b[k] - offset).abs() < 1e-9, "bin {}", k);
    }
}

#[test]
fn analysis_is_deterministic() {
    let wave = Waveform::mono(noise(0.8, 30_000, 99), 48000).unwrap();
    let config = AnalysisConfig::default();

    let first = analyze(&wave, &config).unwrap();
    let second = analyze(&wave, &config).unwrap();

    assert_eq!(first.spectrogram, second.spectrogram);
    assert_eq!(first.cutoff, second.cutoff);
    assert_eq!(first.dominant_band, second.dominant_band);
}
