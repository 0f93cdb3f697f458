//! Typed classification of SDP lines
//!
//! Only the line shapes the codec filter acts on get their own variant;
//! everything else is `Other` and passes through the filter untouched.

/// One classified SDP line.
///
/// Payload types are `u8` (RTP payload types are 0-127). A line whose
/// payload field does not parse classifies as [`SdpLine::Other`]: it is
/// never matched, never dropped, and copied verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SdpLine<'a> {
    /// `m=<kind> <port> <proto> <fmt>...` - starts a media section.
    MediaHeader { kind: &'a str },
    /// `a=rtpmap:<pt> <encoding>` - maps a payload type to a codec.
    Rtpmap { payload: u8, encoding: &'a str },
    /// `a=fmtp:<pt> <params>` - format parameters. When the parameter
    /// string is exactly `apt=<digits>`, this payload type retransmits
    /// the `apt` partner.
    Fmtp { payload: u8, apt: Option<u8> },
    /// `a=rtcp-fb:<pt> ...` - feedback scoped to a payload type.
    RtcpFb { payload: u8 },
    /// Anything else, including session-level lines.
    Other,
}

/// Classify a single line. The caller strips one trailing `'\r'` first so
/// CRLF and LF documents classify identically.
pub(crate) fn classify(line: &str) -> SdpLine<'_> {
    if let Some(rest) = line.strip_prefix("m=") {
        let kind = rest
            .split_once(' ')
            .map(|(kind, _)| kind)
            .unwrap_or(rest);
        return SdpLine::MediaHeader { kind };
    }

    if let Some(rest) = line.strip_prefix("a=rtpmap:") {
        if let Some((payload, tail)) = payload_prefix(rest) {
            let encoding = tail.strip_prefix(' ').unwrap_or("");
            return SdpLine::Rtpmap { payload, encoding };
        }
    }

    if let Some(rest) = line.strip_prefix("a=fmtp:") {
        if let Some((payload, tail)) = payload_prefix(rest) {
            let apt = tail
                .strip_prefix(" apt=")
                .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|digits| digits.parse().ok());
            return SdpLine::Fmtp { payload, apt };
        }
    }

    if let Some(rest) = line.strip_prefix("a=rtcp-fb:") {
        if let Some((payload, _)) = payload_prefix(rest) {
            return SdpLine::RtcpFb { payload };
        }
    }

    SdpLine::Other
}

/// Split a leading run of ASCII digits off `rest` and parse it as a
/// payload type. Returns the payload and the remainder of the line.
fn payload_prefix(rest: &str) -> Option<(u8, &str)> {
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let payload = rest[..digits_end].parse().ok()?;
    Some((payload, &rest[digits_end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_media_headers() {
        assert_eq!(
            classify("m=video 9 UDP/TLS/RTP/SAVPF 96 97"),
            SdpLine::MediaHeader { kind: "video" }
        );
        assert_eq!(
            classify("m=audio 9 UDP/TLS/RTP/SAVPF 111"),
            SdpLine::MediaHeader { kind: "audio" }
        );
    }

    #[test]
    fn classifies_rtpmap() {
        assert_eq!(
            classify("a=rtpmap:96 VP8/90000"),
            SdpLine::Rtpmap {
                payload: 96,
                encoding: "VP8/90000"
            }
        );
    }

    #[test]
    fn rtpmap_without_encoding_is_still_payload_scoped() {
        assert_eq!(
            classify("a=rtpmap:96"),
            SdpLine::Rtpmap {
                payload: 96,
                encoding: ""
            }
        );
    }

    #[test]
    fn fmtp_with_bare_apt_is_a_retransmission_parameter() {
        assert_eq!(
            classify("a=fmtp:97 apt=96"),
            SdpLine::Fmtp {
                payload: 97,
                apt: Some(96)
            }
        );
    }

    #[test]
    fn fmtp_with_other_parameters_has_no_partner() {
        assert_eq!(
            classify("a=fmtp:102 level-asymmetry-allowed=1;packetization-mode=1"),
            SdpLine::Fmtp {
                payload: 102,
                apt: None
            }
        );
        // apt buried in a longer parameter list is not the bare rtx form
        assert_eq!(
            classify("a=fmtp:97 apt=96;rtx-time=3000"),
            SdpLine::Fmtp {
                payload: 97,
                apt: None
            }
        );
    }

    #[test]
    fn classifies_rtcp_fb() {
        assert_eq!(classify("a=rtcp-fb:96 nack pli"), SdpLine::RtcpFb { payload: 96 });
    }

    #[test]
    fn unparsable_payload_is_other() {
        assert_eq!(classify("a=rtpmap:999 VP8/90000"), SdpLine::Other);
        assert_eq!(classify("a=rtpmap:x VP8/90000"), SdpLine::Other);
    }

    #[test]
    fn session_level_lines_are_other() {
        assert_eq!(classify("v=0"), SdpLine::Other);
        assert_eq!(classify("a=mid:0"), SdpLine::Other);
        assert_eq!(classify("c=IN IP4 0.0.0.0"), SdpLine::Other);
    }
}
