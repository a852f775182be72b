pub mod flickr;
mod flickr_types;

pub use flickr::{
    FlickrSearchClient, FlickrSettings, MAX_SEARCH_PAGES, PhotoSearchClient,
    SearchError, SearchHit, SearchPage, parse_search_response,
};
