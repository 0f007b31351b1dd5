use std::convert::Infallible;

use mongodb::options::FindOptions;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Request};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PageState {
    pub page_length: u32,
    pub page: u32,
}

impl Default for PageState {
    fn default() -> Self {
        PageState {
            page_length: 20,
            page: 0,
        }
    }
}

impl PageState {
    /// Skip/limit options for a paged collection query.
    pub fn find_options(&self) -> FindOptions {
        FindOptions::builder()
            .skip(u64::from(self.page) * u64::from(self.page_length))
            .limit(i64::from(self.page_length))
            .build()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PageState {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> rocket::request::Outcome<Self, Self::Error> {
        let length: Option<u32> = request
            .query_value("len")
            .and_then(|it| it.ok())
            .or_else(|| request.query_value("l").and_then(|it| it.ok()));

        let page: Option<u32> = request
            .query_value("page")
            .and_then(|it| it.ok())
            .or_else(|| request.query_value("p").and_then(|it| it.ok()));

        if let Some(p) = page {
            Outcome::Success(PageState {
                page_length: length.unwrap_or(20),
                page: p,
            })
        } else {
            Outcome::Success(Default::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_options_skip_matches_page() {
        let page = PageState {
            page_length: 25,
            page: 3,
        };
        let options = page.find_options();
        assert_eq!(options.skip, Some(75));
        assert_eq!(options.limit, Some(25));
    }
}
