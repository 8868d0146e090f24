//! Minimal RIFF/WAV container synthesis for clip-embedded PCM. The audio
//! backend only accepts a self-describing container, so the raw samples a
//! DefineSound tag carries are wrapped on the fly right before submission.

use crate::flash::stream::SoundDef;

/// Wrap raw PCM samples in a playable WAV container
pub fn synthesize_wav(def: &SoundDef) -> Vec<u8> {
    let block_align = def.channels as u32 * (def.bits as u32 / 8);
    let byte_rate = def.sample_rate * block_align;
    let data_len = def.samples.len() as u32;

    let mut out = Vec::with_capacity(44 + def.samples.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&(def.channels as u16).to_le_bytes());
    out.extend_from_slice(&def.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&(block_align as u16).to_le_bytes());
    out.extend_from_slice(&(def.bits as u16).to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&def.samples);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def() -> SoundDef {
        SoundDef {
            sample_rate: 11025,
            bits: 16,
            channels: 1,
            sample_count: 4,
            samples: vec![0, 1, 2, 3, 4, 5, 6, 7],
        }
    }

    #[test]
    fn container_layout() {
        let wav = synthesize_wav(&def());
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(wav.len(), 44 + 8);
    }

    #[test]
    fn format_fields() {
        let wav = synthesize_wav(&def());
        let channels = u16::from_le_bytes([wav[22], wav[23]]);
        let rate = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        let bits = u16::from_le_bytes([wav[34], wav[35]]);
        assert_eq!(channels, 1);
        assert_eq!(rate, 11025);
        assert_eq!(bits, 16);
        // byte rate = rate * channels * bits/8
        let byte_rate = u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]);
        assert_eq!(byte_rate, 22050);
    }
}
