pub mod wikitext;
