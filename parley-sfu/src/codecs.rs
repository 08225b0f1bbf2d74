use mediasoup::prelude::*;
use std::num::{NonZeroU32, NonZeroU8};

/// The codec set every router is created with: Opus stereo at 48 kHz with
/// in-band FEC and DTX, plus VP8, VP9 and H.264 constrained-baseline for
/// video. Clients outside this set fail the can-consume probe.
pub fn media_codecs() -> Vec<RtpCodecCapability> {
    vec![
        RtpCodecCapability::Audio {
            mime_type: MimeTypeAudio::Opus,
            preferred_payload_type: None,
            clock_rate: NonZeroU32::new(48000).unwrap(),
            channels: NonZeroU8::new(2).unwrap(),
            parameters: RtpCodecParametersParameters::from([
                ("useinbandfec", 1_u32.into()),
                ("usedtx", 1_u32.into()),
            ]),
            rtcp_feedback: vec![RtcpFeedback::TransportCc],
        },
        RtpCodecCapability::Video {
            mime_type: MimeTypeVideo::Vp8,
            preferred_payload_type: None,
            clock_rate: NonZeroU32::new(90000).unwrap(),
            parameters: RtpCodecParametersParameters::default(),
            rtcp_feedback: video_rtcp_feedback(),
        },
        RtpCodecCapability::Video {
            mime_type: MimeTypeVideo::Vp9,
            preferred_payload_type: None,
            clock_rate: NonZeroU32::new(90000).unwrap(),
            parameters: RtpCodecParametersParameters::from([("profile-id", 2_u32.into())]),
            rtcp_feedback: video_rtcp_feedback(),
        },
        RtpCodecCapability::Video {
            mime_type: MimeTypeVideo::H264,
            preferred_payload_type: None,
            clock_rate: NonZeroU32::new(90000).unwrap(),
            parameters: RtpCodecParametersParameters::from([
                ("packetization-mode", 1_u32.into()),
                ("profile-level-id", "42e01f".into()),
                ("level-asymmetry-allowed", 1_u32.into()),
            ]),
            rtcp_feedback: video_rtcp_feedback(),
        },
    ]
}

fn video_rtcp_feedback() -> Vec<RtcpFeedback> {
    vec![
        RtcpFeedback::Nack,
        RtcpFeedback::NackPli,
        RtcpFeedback::CcmFir,
        RtcpFeedback::GoogRemb,
        RtcpFeedback::TransportCc,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_set() {
        let codecs = media_codecs();
        assert_eq!(codecs.len(), 4);

        let audio = codecs
            .iter()
            .filter(|c| matches!(c, RtpCodecCapability::Audio { .. }))
            .count();
        let video = codecs
            .iter()
            .filter(|c| matches!(c, RtpCodecCapability::Video { .. }))
            .count();
        assert_eq!(audio, 1);
        assert_eq!(video, 3);
    }

    #[test]
    fn test_opus_has_fec_and_dtx() {
        let codecs = media_codecs();
        let RtpCodecCapability::Audio {
            clock_rate,
            channels,
            parameters,
            ..
        } = &codecs[0]
        else {
            panic!("first codec must be audio");
        };

        assert_eq!(clock_rate.get(), 48000);
        assert_eq!(channels.get(), 2);
        let expected = RtpCodecParametersParameters::from([
            ("useinbandfec", 1_u32.into()),
            ("usedtx", 1_u32.into()),
        ]);
        assert_eq!(parameters, &expected);
    }
}
