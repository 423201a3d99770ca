use tracing::warn;

use crate::error::{Error, Result};

/// Reads the business URL list: one URL per line, blank lines and `#`
/// comments ignored. An empty result is fatal; the run has nothing to do.
pub async fn read_url_list(path: &str) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        warn!(path = path, error = %e, "Failed to read input URL file");
        Error::Io(e)
    })?;

    let urls = parse_url_list(&contents);
    if urls.is_empty() {
        return Err(Error::EmptyInput(format!("no usable URLs in {path}")));
    }
    Ok(urls)
}

fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blanks_and_comments() {
        let contents = "\
# seed list
https://www.yelp.com/biz/alpha

https://www.yelp.com/biz/beta
  # indented comment
  https://www.yelp.com/biz/gamma
";
        let urls = parse_url_list(contents);
        assert_eq!(
            urls,
            vec![
                "https://www.yelp.com/biz/alpha",
                "https://www.yelp.com/biz/beta",
                "https://www.yelp.com/biz/gamma",
            ]
        );
    }

    #[test]
    fn all_comments_is_empty() {
        assert!(parse_url_list("# a\n# b\n").is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = read_url_list("/nonexistent/inputs.txt").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
