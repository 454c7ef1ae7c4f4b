use super::*;

#[test]
fn encode_then_decode_round_trips() {
    let line = encode_request(REQUEST_COMPLETIONS, &["foo.ba", "2"]);
    let (request, args) = decode_request(&line);
    assert_eq!(request, REQUEST_COMPLETIONS);
    assert_eq!(args, vec!["foo.ba", "2"]);
}

#[test]
fn decode_request_with_no_args() {
    let line = encode_request(REQUEST_IS_COMPLETE, &[]);
    let (request, args) = decode_request(&line);
    assert_eq!(request, REQUEST_IS_COMPLETE);
    assert!(args.is_empty());
}
