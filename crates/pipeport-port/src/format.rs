use std::time::Duration;

use crate::error::{PortError, Result};

/// Bits per sample on the linear PCM side of every port.
pub const PCM_BITS_PER_SAMPLE: u16 = 16;

/// Frame period used when the host does not choose one.
pub const DEFAULT_PTIME: Duration = Duration::from_millis(20);

const USEC_IN_SEC: u64 = 1_000_000;

/// Audio format negotiated when a port is created. Fixed for the port's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channel_count: u16,
    pub bits_per_sample: u16,
    /// Whether the pipe carries 8-bit A-law instead of 16-bit PCM.
    pub companded: bool,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::pcm16(8000, 1)
    }
}

impl AudioFormat {
    /// 16-bit linear PCM on both sides of the port.
    pub fn pcm16(sample_rate: u32, channel_count: u16) -> Self {
        Self {
            sample_rate,
            channel_count,
            bits_per_sample: PCM_BITS_PER_SAMPLE,
            companded: false,
        }
    }

    pub fn with_companding(mut self, companded: bool) -> Self {
        self.companded = companded;
        self
    }

    /// Check the constraints every port relies on.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(PortError::invalid("sample rate must be non-zero"));
        }
        if !(1..=2).contains(&self.channel_count) {
            return Err(PortError::invalid(format!(
                "channel count must be 1 or 2, got {}",
                self.channel_count
            )));
        }
        if self.bits_per_sample != PCM_BITS_PER_SAMPLE {
            return Err(PortError::invalid(format!(
                "bits per sample must be {PCM_BITS_PER_SAMPLE}, got {}",
                self.bits_per_sample
            )));
        }
        Ok(())
    }

    /// Samples (across all channels) in one frame period.
    pub fn samples_per_frame(&self, ptime: Duration) -> usize {
        let millis = u64::try_from(ptime.as_millis()).unwrap_or(u64::MAX);
        let per_channel = u64::from(self.sample_rate).saturating_mul(millis) / 1000;
        let total = per_channel.saturating_mul(u64::from(self.channel_count));
        usize::try_from(total).unwrap_or(usize::MAX)
    }

    /// Duration of a frame holding `samples_per_frame` samples, in microseconds.
    pub fn frame_time_usec(&self, samples_per_frame: usize) -> u64 {
        let divisor = u64::from(self.channel_count) * u64::from(self.sample_rate);
        (samples_per_frame as u64)
            .saturating_mul(USEC_IN_SEC)
            .checked_div(divisor)
            .unwrap_or(0)
    }

    /// Average bit rate of the PCM side.
    pub fn avg_bps(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.channel_count) * u64::from(self.bits_per_sample)
    }

    /// Bytes of linear PCM in one frame.
    pub fn pcm_frame_bytes(&self, samples_per_frame: usize) -> usize {
        samples_per_frame.saturating_mul(usize::from(self.bits_per_sample / 8))
    }

    /// Bytes on the pipe for one frame.
    pub fn wire_frame_bytes(&self, samples_per_frame: usize) -> usize {
        let pcm = self.pcm_frame_bytes(samples_per_frame);
        if self.companded {
            pcm / 2
        } else {
            pcm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowband_alaw_geometry() {
        let format = AudioFormat::pcm16(8000, 1).with_companding(true);
        let spf = format.samples_per_frame(DEFAULT_PTIME);

        assert_eq!(spf, 160);
        assert_eq!(format.frame_time_usec(spf), 20_000);
        assert_eq!(format.pcm_frame_bytes(spf), 320);
        assert_eq!(format.wire_frame_bytes(spf), 160);
        assert_eq!(format.avg_bps(), 128_000);
    }

    #[test]
    fn stereo_frame_time_accounts_for_channels() {
        let format = AudioFormat::pcm16(48_000, 2);
        let spf = format.samples_per_frame(Duration::from_millis(10));

        assert_eq!(spf, 960);
        assert_eq!(format.frame_time_usec(spf), 10_000);
        assert_eq!(format.wire_frame_bytes(spf), 1920);
    }

    #[test]
    fn validate_rejects_bad_formats() {
        assert!(AudioFormat::default().validate().is_ok());

        let mut format = AudioFormat::default();
        format.bits_per_sample = 8;
        assert!(matches!(
            format.validate(),
            Err(PortError::InvalidArgument(_))
        ));

        assert!(AudioFormat::pcm16(8000, 0).validate().is_err());
        assert!(AudioFormat::pcm16(8000, 3).validate().is_err());
        assert!(AudioFormat::pcm16(0, 1).validate().is_err());
    }

    #[test]
    fn high_rate_geometry_does_not_overflow() {
        let format = AudioFormat::pcm16(200_000_000, 2);
        assert!(format.validate().is_ok());
        assert_eq!(format.avg_bps(), 6_400_000_000);

        let max = AudioFormat::pcm16(u32::MAX, 2);
        assert_eq!(max.avg_bps(), u64::from(u32::MAX) * 32);
        let spf = max.samples_per_frame(Duration::from_secs(u64::MAX));
        assert!(spf > 0);
        let _ = max.frame_time_usec(spf);
        let _ = max.pcm_frame_bytes(spf);
    }

    #[test]
    fn frame_time_of_invalid_format_is_zero() {
        assert_eq!(AudioFormat::pcm16(0, 1).frame_time_usec(160), 0);
    }
}
