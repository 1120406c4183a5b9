//! Round-trip property: parsing what the renderer produced gives back
//! the same object, byte for byte, for every canonical kind.

use stax_core::{Settings, Tag};
use stax_runtime::Runtime;
use stax_text::{parse, render};

/// Render an object, parse the text, compare the encodings.
fn roundtrip(rt: &mut Runtime, id: stax_runtime::ObjectId, settings: &Settings) {
    let text = render(rt, id, settings).unwrap();
    let original = rt.object_vec(id);
    let (back, consumed) = parse(rt, &text, settings)
        .unwrap_or_else(|e| panic!("reparse of {text:?} failed: {e:?}"));
    assert_eq!(consumed, text.len(), "trailing input for {text:?}");
    assert_eq!(
        rt.object_vec(back),
        original,
        "round trip changed {text:?}"
    );
}

fn roundtrip_source(text: &str) {
    let mut rt = Runtime::new();
    let settings = Settings::default();
    let (id, consumed) = parse(&mut rt, text, &settings).unwrap();
    assert_eq!(consumed, text.len());
    roundtrip(&mut rt, id, &settings);
}

#[test]
fn integers() {
    let mut rt = Runtime::new();
    let settings = Settings::default();
    for value in [0i64, 1, -1, 42, -42, 1_000_000, i64::MAX, i64::MIN + 1] {
        let id = rt.make_integer(value).unwrap();
        roundtrip(&mut rt, id, &settings);
    }
}

#[test]
fn bignums() {
    let mut rt = Runtime::new();
    let settings = Settings::default();
    for magnitude in [
        vec![0u8, 0, 0, 0, 0, 0, 0, 0, 1],
        vec![0xFF; 16],
        vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
    ] {
        let id = rt.make_bignum(Tag::Bignum, &magnitude).unwrap();
        roundtrip(&mut rt, id, &settings);
        let id = rt.make_bignum(Tag::NegBignum, &magnitude).unwrap();
        roundtrip(&mut rt, id, &settings);
    }
}

#[test]
fn integers_with_grouping() {
    let mut rt = Runtime::new();
    let mut settings = Settings::default();
    settings.spacing_mantissa = 3;
    let id = rt.make_integer(1234567890).unwrap();
    let text = render(&rt, id, &settings).unwrap();
    assert!(text.contains(settings.space));
    // Grouping is display-only; the parser does not read it back, so the
    // round trip is checked on the ungrouped form.
    settings.spacing_mantissa = 0;
    roundtrip(&mut rt, id, &settings);
}

#[test]
fn fractions() {
    for text in ["1/3", "-3/4", "22/7", "-1/999999999999"] {
        roundtrip_source(text);
    }
}

#[test]
fn decimals() {
    for text in [
        "0.", "1.", "-1.", "2.5", "-0.125", "3.14159", "1.E40", "1.23E-38", "0.001",
    ] {
        roundtrip_source(text);
    }
}

#[test]
fn based_numbers() {
    let mut rt = Runtime::new();
    let settings = Settings::default();
    for value in [0u64, 1, 0xF, 0xFF, 0x1A3, 0xDEADBEEF] {
        let id = rt.make_small(Tag::BasedInteger, value).unwrap();
        roundtrip(&mut rt, id, &settings);
    }
}

#[test]
fn text_objects() {
    for text in ["\"\"", "\"hello\"", "\"two words here\""] {
        roundtrip_source(text);
    }
}

#[test]
fn symbols() {
    for text in ["x", "Velocity", "a1", "_tmp"] {
        roundtrip_source(text);
    }
}

#[test]
fn lists_and_arrays() {
    for text in ["{ }", "{ 1 2 3 }", "{ 1 { 2 3 } \"s\" }", "[ 1 2 ]"] {
        roundtrip_source(text);
    }
}

#[test]
fn programs() {
    for text in [
        "« 1 2 + »",
        "« dup * »",
        "« 1 10 start 7 next »",
        "« 1 10 for i i next »",
        "« do 1 until 1 end »",
        "« while 0 repeat 1 end »",
    ] {
        roundtrip_source(text);
    }
}

#[test]
fn expressions() {
    for text in [
        "'x'",
        "'x+1'",
        "'a+b*c'",
        "'(a+b)*c'",
        "'a^b^c'",
        "'(a^b)^c'",
        "'-x'",
        "'-(x+1)'",
        "'sin(x+1)'",
        "'sqrt(x)'",
        "'a mod b'",
        "'a=b'",
        "'a-(b-c)'",
        "'f(x;y)'",
        "'f(x)+1'",
        "'1/2*x'",
    ] {
        roundtrip_source(text);
    }
}

#[test]
fn complex_objects() {
    for text in ["(1;2)", "(1∡90)", "(-1;2.5)"] {
        roundtrip_source(text);
    }
}

#[test]
fn rendered_canonical_forms() {
    // Rendering is canonical: reparsing and re-rendering is a fixpoint.
    let mut rt = Runtime::new();
    let settings = Settings::default();
    for text in ["'x+1'", "{ 1 2 }", "« dup * »", "3/4", "#Fh"] {
        let (id, _) = parse(&mut rt, text, &settings).unwrap();
        let rendered = render(&rt, id, &settings).unwrap();
        assert_eq!(rendered, text);
    }
}
