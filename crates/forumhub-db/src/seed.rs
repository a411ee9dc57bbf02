//! Default course catalogue.

use forumhub_models::NewCourse;

const DEFAULT_COURSES: &[(&str, &str)] = &[
    ("Java", "Object-oriented programming with Java"),
    ("Python", "Python programming and its ecosystem"),
    ("JavaScript", "Web development with JavaScript"),
    ("Spring Boot", "Building services with Spring Boot"),
    ("React", "Front-end development with React"),
];

pub fn default_courses() -> Vec<NewCourse> {
    DEFAULT_COURSES
        .iter()
        .map(|(name, description)| NewCourse {
            name: (*name).to_string(),
            description: Some((*description).to_string()),
        })
        .collect()
}
