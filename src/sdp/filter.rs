//! Codec filtering of SDP offers

use std::borrow::Cow;

use thiserror::Error;

use super::line::{classify, SdpLine};

/// Payload types that survive filtering for one media section, in
/// insertion order: codec matches first (file order), then their
/// retransmission partners (file order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedSet(Vec<u8>);

impl AllowedSet {
    fn insert(&mut self, payload: u8) {
        if !self.0.contains(&payload) {
            self.0.push(payload);
        }
    }

    pub fn contains(&self, payload: u8) -> bool {
        self.0.contains(&payload)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Soft failure: the target codec was not offered in any section of the
/// requested media kind. Produced by [`FilteredSdp::require_codec`] only;
/// the filter itself treats an empty [`AllowedSet`] as a valid output
/// (the media section degrades to "no usable codec").
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("codec {codec} is not offered in any {kind} section")]
pub struct CodecNotFound {
    pub kind: String,
    pub codec: String,
}

/// Result of [`filter_codec`].
#[derive(Debug, Clone)]
pub struct FilteredSdp {
    /// The rewritten session description.
    pub sdp: String,
    /// Payload types kept in the target media sections.
    pub allowed: AllowedSet,
    kind: String,
    codec: String,
}

impl FilteredSdp {
    /// Check that at least one payload type matched the target codec.
    pub fn require_codec(&self) -> Result<(), CodecNotFound> {
        if self.allowed.is_empty() {
            Err(CodecNotFound {
                kind: self.kind.clone(),
                codec: self.codec.clone(),
            })
        } else {
            Ok(())
        }
    }
}

/// Restrict every `kind` media section of `sdp` to `codec`.
///
/// Two passes over the lines, both tracking whether the cursor is inside a
/// section of the target kind (the flag flips on every `m=` line):
///
/// 1. Discovery: payload types whose rtpmap encoding equals `codec`
///    (case-sensitive) seed the allowed set; an `a=fmtp:<pt> apt=<partner>`
///    line adds `<pt>` when `<partner>` is already allowed. Single pass,
///    top to bottom: a retransmission line whose partner only matches
///    later in the document is not picked up.
/// 2. Rewrite: inside target sections, payload-scoped lines (rtpmap, fmtp,
///    rtcp-fb) whose payload type is not allowed are dropped, and the
///    section header's trailing payload list is replaced with the allowed
///    set in insertion order. Everything else is copied verbatim.
pub fn filter_codec(sdp: &str, kind: &str, codec: &str) -> FilteredSdp {
    let lines: Vec<&str> = sdp.split('\n').collect();

    let mut allowed = AllowedSet::default();
    let mut in_kind = false;
    for line in &lines {
        let body = line.strip_suffix('\r').unwrap_or(line);
        match classify(body) {
            SdpLine::MediaHeader { kind: k } => in_kind = k == kind,
            SdpLine::Rtpmap { payload, encoding } if in_kind && encoding == codec => {
                allowed.insert(payload);
            }
            SdpLine::Fmtp {
                payload,
                apt: Some(partner),
            } if in_kind && allowed.contains(partner) => {
                allowed.insert(payload);
            }
            _ => {}
        }
    }

    let mut out: Vec<Cow<'_, str>> = Vec::with_capacity(lines.len());
    let mut in_kind = false;
    for line in &lines {
        let body = line.strip_suffix('\r').unwrap_or(line);
        let had_cr = body.len() != line.len();
        match classify(body) {
            SdpLine::MediaHeader { kind: k } => {
                in_kind = k == kind;
                if in_kind {
                    let mut rebuilt = rewrite_media_header(body, &allowed);
                    if had_cr {
                        rebuilt.push('\r');
                    }
                    out.push(Cow::Owned(rebuilt));
                } else {
                    out.push(Cow::Borrowed(*line));
                }
            }
            SdpLine::Rtpmap { payload, .. }
            | SdpLine::Fmtp { payload, .. }
            | SdpLine::RtcpFb { payload }
                if in_kind && !allowed.contains(payload) => {}
            _ => out.push(Cow::Borrowed(*line)),
        }
    }

    FilteredSdp {
        sdp: out.join("\n"),
        allowed,
        kind: kind.to_owned(),
        codec: codec.to_owned(),
    }
}

/// Replace the header's trailing run of numeric payload tokens with the
/// allowed set. Port and proto stay put: they are followed by non-numeric
/// tokens or sit before the payload list.
fn rewrite_media_header(header: &str, allowed: &AllowedSet) -> String {
    let mut head = header.trim_end();
    while let Some(pos) = head.rfind(' ') {
        let token = &head[pos + 1..];
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            head = head[..pos].trim_end();
        } else {
            break;
        }
    }

    let mut rebuilt = String::from(head);
    for payload in allowed.as_slice() {
        rebuilt.push(' ');
        rebuilt.push_str(&payload.to_string());
    }
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFER: &str = "v=0\n\
o=- 4611731400430051336 2 IN IP4 127.0.0.1\n\
s=-\n\
t=0 0\n\
a=group:BUNDLE 0 1\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111 103\n\
c=IN IP4 0.0.0.0\n\
a=mid:0\n\
a=rtpmap:111 opus/48000/2\n\
a=rtpmap:103 ISAC/16000\n\
a=fmtp:111 minptime=10;useinbandfec=1\n\
m=video 9 UDP/TLS/RTP/SAVPF 96 97 102 121\n\
c=IN IP4 0.0.0.0\n\
a=mid:1\n\
a=rtpmap:96 VP8/90000\n\
a=rtcp-fb:96 nack\n\
a=rtcp-fb:96 nack pli\n\
a=rtpmap:97 rtx/90000\n\
a=fmtp:97 apt=96\n\
a=rtpmap:102 H264/90000\n\
a=rtcp-fb:102 nack\n\
a=fmtp:102 level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42001f\n\
a=rtpmap:121 rtx/90000\n\
a=fmtp:121 apt=102\n\
a=rtcp-mux\n";

    #[test]
    fn keeps_codec_and_its_rtx_partner() {
        let filtered = filter_codec(OFFER, "video", "VP8/90000");

        assert_eq!(filtered.allowed.as_slice(), &[96, 97]);
        assert!(filtered
            .sdp
            .contains("m=video 9 UDP/TLS/RTP/SAVPF 96 97\n"));
        assert!(filtered.sdp.contains("a=rtpmap:96 VP8/90000\n"));
        assert!(filtered.sdp.contains("a=fmtp:97 apt=96\n"));
        assert!(!filtered.sdp.contains("a=rtpmap:102"));
        assert!(!filtered.sdp.contains("a=rtcp-fb:102"));
        assert!(!filtered.sdp.contains("a=rtpmap:121"));
        assert!(!filtered.sdp.contains("a=fmtp:121"));
    }

    #[test]
    fn single_codec_without_rtx_rewrites_only_the_header() {
        let offer = "v=0\n\
m=video 9 UDP/TLS/RTP/SAVPF 102\n\
a=rtpmap:102 H264/90000\n\
a=rtcp-mux\n";
        let filtered = filter_codec(offer, "video", "H264/90000");

        assert_eq!(filtered.allowed.as_slice(), &[102]);
        assert_eq!(
            filtered.sdp,
            "v=0\n\
m=video 9 UDP/TLS/RTP/SAVPF 102\n\
a=rtpmap:102 H264/90000\n\
a=rtcp-mux\n"
        );
    }

    #[test]
    fn rtx_partner_declared_before_its_codec_is_not_picked_up() {
        // Single-pass discovery: the apt line is scanned before 96 is
        // allowed, so 97 stays out. Order-dependent on purpose.
        let offer = "m=video 9 UDP/TLS/RTP/SAVPF 96 97\n\
a=rtpmap:97 rtx/90000\n\
a=fmtp:97 apt=96\n\
a=rtpmap:96 VP8/90000\n";
        let filtered = filter_codec(offer, "video", "VP8/90000");

        assert_eq!(filtered.allowed.as_slice(), &[96]);
        assert!(filtered.sdp.contains("m=video 9 UDP/TLS/RTP/SAVPF 96\n"));
        assert!(!filtered.sdp.contains("a=rtpmap:97"));
        assert!(!filtered.sdp.contains("a=fmtp:97"));
    }

    #[test]
    fn absent_codec_empties_the_section() {
        let filtered = filter_codec(OFFER, "video", "AV1/90000");

        assert!(filtered.allowed.is_empty());
        assert!(filtered.require_codec().is_err());
        assert!(filtered.sdp.contains("m=video 9 UDP/TLS/RTP/SAVPF\n"));
        // every payload-scoped line in the video section is gone
        let video_section: Vec<&str> = filtered
            .sdp
            .split('\n')
            .skip_while(|l| !l.starts_with("m=video"))
            .skip(1)
            .take_while(|l| !l.starts_with("m="))
            .collect();
        assert_eq!(video_section, vec!["c=IN IP4 0.0.0.0", "a=mid:1", "a=rtcp-mux", ""]);
    }

    #[test]
    fn non_target_sections_are_untouched() {
        let filtered = filter_codec(OFFER, "video", "VP8/90000");

        let audio_in: Vec<&str> = OFFER
            .split('\n')
            .skip_while(|l| !l.starts_with("m=audio"))
            .take_while(|l| !l.starts_with("m=video"))
            .collect();
        let audio_out: Vec<&str> = filtered
            .sdp
            .split('\n')
            .skip_while(|l| !l.starts_with("m=audio"))
            .take_while(|l| !l.starts_with("m=video"))
            .collect();
        assert_eq!(audio_in, audio_out);

        let prefix_in: Vec<&str> = OFFER
            .split('\n')
            .take_while(|l| !l.starts_with("m="))
            .collect();
        let prefix_out: Vec<&str> = filtered
            .sdp
            .split('\n')
            .take_while(|l| !l.starts_with("m="))
            .collect();
        assert_eq!(prefix_in, prefix_out);
    }

    #[test]
    fn crlf_documents_filter_like_lf_ones() {
        let offer = OFFER.replace('\n', "\r\n");
        let filtered = filter_codec(&offer, "video", "VP8/90000");

        assert_eq!(filtered.allowed.as_slice(), &[96, 97]);
        assert!(filtered
            .sdp
            .contains("m=video 9 UDP/TLS/RTP/SAVPF 96 97\r\n"));
        assert!(filtered.sdp.contains("a=rtpmap:96 VP8/90000\r\n"));
        assert!(!filtered.sdp.contains("a=rtpmap:102"));
    }

    #[test]
    fn codec_match_is_exact_and_case_sensitive() {
        assert!(filter_codec(OFFER, "video", "vp8/90000").allowed.is_empty());
        assert!(filter_codec(OFFER, "video", "VP8").allowed.is_empty());
    }

    #[test]
    fn audio_kind_filters_the_audio_section() {
        let filtered = filter_codec(OFFER, "audio", "opus/48000/2");

        assert_eq!(filtered.allowed.as_slice(), &[111]);
        assert!(filtered.sdp.contains("m=audio 9 UDP/TLS/RTP/SAVPF 111\n"));
        assert!(!filtered.sdp.contains("a=rtpmap:103"));
        assert!(filtered.sdp.contains("a=fmtp:111 minptime=10;useinbandfec=1\n"));
        // the video section keeps all of its payload types
        assert!(filtered
            .sdp
            .contains("m=video 9 UDP/TLS/RTP/SAVPF 96 97 102 121\n"));
        assert!(filtered.sdp.contains("a=rtpmap:102 H264/90000\n"));
    }
}
