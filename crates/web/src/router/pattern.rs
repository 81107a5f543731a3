/// Rewrites `:name` segments into the `{name}` form the matcher understands.
///
/// Segments already in `{name}` or `{*name}` form are kept as they are.
pub(crate) fn translate(route: &str) -> String {
    route
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => segment.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
