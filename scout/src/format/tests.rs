use super::*;

fn ctx(color: ColorChoice, verbosity: VerbosityLevel) -> AppContext {
    let dir = tempfile::tempdir().unwrap();
    AppContext::build_from(&dir.path().join("config.yaml"), color, verbosity)
}

#[test]
fn test_color_choice_from_string() {
    assert_eq!(ColorChoice::from("always"), ColorChoice::Always);
    assert_eq!(ColorChoice::from("NEVER"), ColorChoice::Never);
    assert_eq!(ColorChoice::from("auto"), ColorChoice::Auto);
    assert_eq!(ColorChoice::from("whatever"), ColorChoice::Auto);
}

#[test]
fn test_should_color_follows_explicit_choice() {
    assert!(should_color(&ctx(ColorChoice::Always, VerbosityLevel::Normal)));
    assert!(!should_color(&ctx(ColorChoice::Never, VerbosityLevel::Normal)));
}

#[test]
fn test_plain_formatter_spinner_is_hidden() {
    let spinner = PlainFormatter.spinner("working");
    assert!(spinner.is_hidden());
    PlainFormatter.finish_progress(spinner, "done");
}

#[test]
fn test_print_respects_verbosity() {
    // Output goes to stderr; these only check nothing panics at each level
    let quiet = ctx(ColorChoice::Never, VerbosityLevel::Normal);
    print(&quiet, VerbosityLevel::Verbose, "should not print");

    let verbose = ctx(ColorChoice::Never, VerbosityLevel::VeryVerbose);
    print(&verbose, VerbosityLevel::Verbose, "should print");
    print(&verbose, VerbosityLevel::Trace, "should not print");
}

#[test]
fn test_create_formatter_never_is_plain() {
    let formatter = create_formatter(&ctx(ColorChoice::Never, VerbosityLevel::Normal));
    assert!(formatter.spinner("x").is_hidden());
}
