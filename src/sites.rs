/// A job board worth checking for new adverts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobBoard {
    pub name: &'static str,
    pub url: &'static str,
}

pub const JOB_BOARDS: [JobBoard; 6] = [
    JobBoard {
        name: "Inria",
        url: "http://www.inria.fr/institut/recrutement-metiers/offres",
    },
    JobBoard {
        name: "Inria - Flowers team",
        url: "https://flowers.inria.fr/jobs/",
    },
    JobBoard {
        name: "Ademe",
        url: "http://www.ademe.fr/lademe-recrute",
    },
    JobBoard {
        name: "CEA",
        url: "http://moorea.cea.fr/Web/ListeDoss.aspx",
    },
    JobBoard {
        name: "GitHub Jobs",
        url: "https://jobs.github.com/positions",
    },
    JobBoard {
        name: "Stackoverflow Careers",
        url: "http://careers.stackoverflow.com/jobs",
    },
];
