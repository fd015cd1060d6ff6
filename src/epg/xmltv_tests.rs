//! Tests for XMLTV writing and reading it back

#[cfg(test)]
mod tests {
    use crate::epg::*;
    use crate::models::{Channel, EpgDocument, Programme};

    fn sample_document() -> EpgDocument {
        EpgDocument {
            channels: vec![
                Channel {
                    id: "trt1".into(),
                    display_name: "TRT 1".into(),
                    icon: Some("http://example.com/trt1.png?size=64&fmt=png".into()),
                },
                Channel {
                    id: "show".into(),
                    display_name: "Show <TV> & \"Friends\"".into(),
                    icon: None,
                },
            ],
            programmes: vec![
                Programme {
                    channel_id: "trt1".into(),
                    start: parse_xmltv_time("20240101100000 +0300").unwrap(),
                    stop: parse_xmltv_time("20240101110000 +0300").unwrap(),
                    title: "Haberler".into(),
                    description: Some("Ana haber bülteni".into()),
                    category: Some("News".into()),
                },
                Programme {
                    channel_id: "show".into(),
                    start: parse_xmltv_time("20240101183000 +0000").unwrap(),
                    stop: parse_xmltv_time("20240101193000 +0000").unwrap(),
                    title: "Tom & Jerry <Classic>".into(),
                    description: None,
                    category: None,
                },
                Programme {
                    channel_id: "trt1".into(),
                    start: parse_xmltv_time("20240101090000 +0300").unwrap(),
                    stop: parse_xmltv_time("20240101100000 +0300").unwrap(),
                    title: "Sabah".into(),
                    description: None,
                    category: None,
                },
            ],
        }
    }

    fn read_back(xml: &str) -> EpgDocument {
        let listing = EpgParser::parse(xml).unwrap();
        assert_eq!(listing.skipped, 0);
        let (doc, _) = normalize(listing, &ChannelFilter::all()).unwrap();
        doc
    }

    #[test]
    fn test_round_trip() {
        let doc = sample_document();
        let xml = to_xmltv(&doc).unwrap();
        assert_eq!(read_back(&xml), doc);
    }

    #[test]
    fn test_round_trip_keeps_inner_whitespace() {
        let mut doc = sample_document();
        doc.channels[0].display_name = "TRT  1".into();
        doc.programmes[0].description = Some("Ana haber\n\tbülteni".into());
        doc.programmes[1].title = "Tom &amp; Jerry".into();

        let xml = to_xmltv(&doc).unwrap();
        assert_eq!(read_back(&xml), doc);
    }

    #[test]
    fn test_round_trip_keeps_offsets() {
        let doc = sample_document();
        let again = read_back(&to_xmltv(&doc).unwrap());
        for (a, b) in doc.programmes.iter().zip(&again.programmes) {
            assert_eq!(format_xmltv_time(&a.start), format_xmltv_time(&b.start));
            assert_eq!(format_xmltv_time(&a.stop), format_xmltv_time(&b.stop));
        }
    }

    #[test]
    fn test_declaration_and_structure() {
        let xml = to_xmltv(&sample_document()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<tv generator-info-name="epg_grab">"#));
        assert!(xml.contains(r#"<channel id="trt1">"#));
        assert!(xml.contains("<display-name>TRT 1</display-name>"));
        assert!(xml.trim_end().ends_with("</tv>"));
    }

    #[test]
    fn test_channels_before_programmes_in_source_order() {
        let xml = to_xmltv(&sample_document()).unwrap();
        let last_channel = xml.rfind("<channel ").unwrap();
        let first_programme = xml.find("<programme ").unwrap();
        assert!(last_channel < first_programme);

        // not re-sorted by start time
        let haber = xml.find("Haberler").unwrap();
        let sabah = xml.find("Sabah").unwrap();
        assert!(haber < sabah);
    }

    #[test]
    fn test_reserved_characters_escaped() {
        let xml = to_xmltv(&sample_document()).unwrap();
        assert!(xml.contains("<title>Tom &amp; Jerry &lt;Classic&gt;</title>"));
        assert!(xml.contains("size=64&amp;fmt=png"));
        assert!(!xml.contains("Tom & Jerry"));
    }

    #[test]
    fn test_optional_children_omitted() {
        let doc = EpgDocument {
            channels: vec![Channel {
                id: "c1".into(),
                display_name: "Kanal 1".into(),
                icon: None,
            }],
            programmes: vec![Programme {
                channel_id: "c1".into(),
                start: parse_xmltv_time("20240101100000 +0000").unwrap(),
                stop: parse_xmltv_time("20240101110000 +0000").unwrap(),
                title: "Haber".into(),
                description: None,
                category: None,
            }],
        };
        let xml = to_xmltv(&doc).unwrap();
        assert!(xml.contains(
            r#"<programme start="20240101100000 +0000" stop="20240101110000 +0000" channel="c1">"#
        ));
        assert!(xml.contains("<title>Haber</title>"));
        assert!(!xml.contains("<desc"));
        assert!(!xml.contains("<icon"));
    }

    #[test]
    fn test_empty_document() {
        let xml = to_xmltv(&EpgDocument::default()).unwrap();
        let listing = EpgParser::parse(&xml).unwrap();
        assert!(listing.channels.is_empty());
        assert!(listing.programmes.is_empty());
    }
}
