use logdrain::masking::{default_rules, mask_defaults, Preprocessor};
use logdrain::ConfigError;

#[test]
fn default_rules_mask_common_fields() {
    let input = "User 123 logged in from 192.168.1.1 at 2024-01-01T12:00:00Z contact john.doe@example.com";
    assert_eq!(mask_defaults(input), "User <*> logged in from <*> at <*> contact <*>");
}

#[test]
fn default_rules_mask_uuid_url_and_hex() {
    let input = "uuid 550e8400-e29b-41d4-a716-446655440000 url https://example.com/a hex deadbeefcafebabe";
    assert_eq!(mask_defaults(input), "uuid <*> url <*> hex <*>");
}

#[test]
fn default_rules_mask_ipv6_and_decimals() {
    let input = "peer fe80:0:0:0:202:b3ff:fe1e:8329 load 3.5";
    assert_eq!(mask_defaults(input), "peer <*> load <*>");
}

#[test]
fn default_rules_compile_as_preprocess_rules() {
    let pre = Preprocessor::new(&default_rules()).unwrap();
    assert_eq!(pre.apply("took 15 ms"), "took <*> ms");
}

#[test]
fn user_rules_apply_in_order() {
    let pre = Preprocessor::new(&[r"blk_-?\d+", r"(\d+\.){3}\d+"]).unwrap();
    assert_eq!(pre.apply("Receiving blk_-123 from 10.0.0.1"), "Receiving <*> from <*>");
}

#[test]
fn invalid_rule_is_a_config_error() {
    let err = Preprocessor::new(&["(unclosed"]).unwrap_err();
    match err {
        ConfigError::InvalidRule { pattern, .. } => assert_eq!(pattern, "(unclosed"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn empty_preprocessor_leaves_line_alone() {
    let pre = Preprocessor::default();
    assert!(pre.is_empty());
    assert_eq!(pre.apply("id 42"), "id 42");
}
