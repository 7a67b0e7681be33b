pub mod pixel;
pub mod color_classifier;
pub mod color_clusterer;
pub mod color_vector;
pub mod emotion_lexicon;
pub mod emotion_mapper;
pub mod similarity;
pub mod similarity_graph;
pub mod report;
