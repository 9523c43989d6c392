use crate::domain::model::Book;

struct Sample {
    id: &'static str,
    title: &'static str,
    author: &'static str,
    description: &'static str,
    categories: [&'static str; 2],
    rating: f64,
    pages: u32,
    published: &'static str,
}

const SAMPLES: [Sample; 10] = [
    Sample {
        id: "cygWzgEACAAJ",
        title: "The Seven Husbands of Evelyn Hugo",
        author: "Taylor Jenkins Reid",
        description: "From the New York Times bestselling author of Malibu Rising comes the story of legendary film actress Evelyn Hugo, who has lived a life of glamour, ambition, and scandal. When she finally decides to tell her story, she chooses unknown magazine reporter Monique Grant for the job.",
        categories: ["Fiction", "Romance"],
        rating: 4.3,
        pages: 400,
        published: "2017-06-13",
    },
    Sample {
        id: "NzjhzQEACAAJ",
        title: "Project Hail Mary",
        author: "Andy Weir",
        description: "The sole survivor on a desperate, last-chance mission, and if he fails, humanity and the earth itself will perish. Except that right now, he doesn't know that. He can't even remember his own name, let alone the nature of his assignment or how to complete it.",
        categories: ["Science Fiction", "Thriller"],
        rating: 4.6,
        pages: 482,
        published: "2021-05-04",
    },
    Sample {
        id: "XVvGzwEACAAJ",
        title: "The Thursday Murder Club",
        author: "Richard Osman",
        description: "Four unlikely friends meet each week to investigate cold cases. But when a brutal murder occurs in their own backyard, the Thursday Murder Club find themselves in the middle of their first live case.",
        categories: ["Mystery", "Crime"],
        rating: 4.1,
        pages: 368,
        published: "2020-09-03",
    },
    Sample {
        id: "fFCjDwAAQBAJ",
        title: "Atomic Habits",
        author: "James Clear",
        description: "An easy & proven way to build good habits & break bad ones. Tiny changes, remarkable results. No matter your goals, Atomic Habits offers a proven framework for improving every day.",
        categories: ["Self Help", "Psychology"],
        rating: 4.7,
        pages: 320,
        published: "2018-10-16",
    },
    Sample {
        id: "RLV5DwAAQBAJ",
        title: "The Silent Patient",
        author: "Alex Michaelides",
        description: "A woman's act of violence against her husband, and the therapist obsessed with uncovering her motive. It will keep you guessing until the final page.",
        categories: ["Mystery", "Psychological Thriller"],
        rating: 4.2,
        pages: 336,
        published: "2019-02-05",
    },
    Sample {
        id: "2ObWDgAAQBAJ",
        title: "Educated",
        author: "Tara Westover",
        description: "A memoir about a young girl who, kept out of school, leaves her survivalist family and goes on to earn a PhD from Cambridge University.",
        categories: ["Biography", "Memoir"],
        rating: 4.4,
        pages: 334,
        published: "2018-02-20",
    },
    Sample {
        id: "W2ZDDwAAQBAJ",
        title: "The Midnight Library",
        author: "Matt Haig",
        description: "Between life and death there is a library, and within that library, the shelves go on forever. Every book provides a chance to try another life you could have lived.",
        categories: ["Fiction", "Fantasy"],
        rating: 4.0,
        pages: 288,
        published: "2020-08-13",
    },
    Sample {
        id: "B1hSG45JCX4C",
        title: "Dune",
        author: "Frank Herbert",
        description: "Set on the desert planet Arrakis, Dune is the story of the boy Paul Atreides, heir to a noble family tasked with ruling an inhospitable world.",
        categories: ["Science Fiction", "Adventure"],
        rating: 4.3,
        pages: 688,
        published: "1965-08-01",
    },
    Sample {
        id: "H7GeDAAAQBAJ",
        title: "Normal People",
        author: "Sally Rooney",
        description: "A story of mutual fascination, friendship and love. It takes us from that first conversation to the years beyond, in the company of two people who try to stay apart but find they can't.",
        categories: ["Fiction", "Literary Fiction"],
        rating: 3.9,
        pages: 266,
        published: "2018-08-28",
    },
    Sample {
        id: "hi18DwAAQBAJ",
        title: "Becoming",
        author: "Michelle Obama",
        description: "In her memoir, a work of deep reflection and mesmerizing storytelling, Michelle Obama invites readers into her world, chronicling the experiences that have shaped her.",
        categories: ["Biography", "Politics"],
        rating: 4.5,
        pages: 448,
        published: "2018-11-13",
    },
];

fn cover_url(id: &str, zoom: u8) -> String {
    format!(
        "https://books.google.com/books/content?id={}&printsec=frontcover&img=1&zoom={}",
        id, zoom
    )
}

/// Built-in feed content used whenever the catalog cannot be reached.
pub fn sample_books() -> Vec<Book> {
    SAMPLES
        .iter()
        .map(|s| Book {
            id: s.id.to_string(),
            title: s.title.to_string(),
            authors: vec![s.author.to_string()],
            description: Some(s.description.to_string()),
            categories: s.categories.iter().map(|c| c.to_string()).collect(),
            average_rating: Some(s.rating),
            page_count: Some(s.pages),
            published_date: Some(s.published.to_string()),
            thumbnail_url: Some(cover_url(s.id, 1)),
            large_cover_url: Some(cover_url(s.id, 3)),
            info_link: None,
        })
        .collect()
}
